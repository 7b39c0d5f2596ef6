//! 命令定义和实现

pub mod light;
pub mod r#move;
pub mod stop;

pub use light::LightCommand;
pub use r#move::MoveCommand;
pub use stop::StopCommand;

use anyhow::{Context, Result};
use std::sync::mpsc;
use std::time::Duration;

/// 保持当前状态：指定时长则睡眠，否则阻塞到 Ctrl-C
pub(crate) fn hold(duration_ms: Option<u64>) -> Result<()> {
    match duration_ms {
        Some(ms) => {
            std::thread::sleep(Duration::from_millis(ms));
            Ok(())
        },
        None => wait_for_interrupt(),
    }
}

/// 阻塞直到收到 Ctrl-C
///
/// 每个进程只能注册一次，仅用于 one-shot 命令。
pub(crate) fn wait_for_interrupt() -> Result<()> {
    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .context("Failed to install Ctrl-C handler")?;

    println!("⌨️  按 Ctrl-C 停止");
    rx.recv().context("Ctrl-C handler dropped")?;
    println!("^C");
    Ok(())
}
