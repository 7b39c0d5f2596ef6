//! REPL 模式实现
//!
//! 交互式 Shell：小键盘遥控 + 带名字的命令。
//!
//! 每个运动按键执行一次定时运动（阻塞，结束时自动停止），
//! 因此 Shell 空闲时机械臂总是静止的。

use anyhow::{Context, Result};
use clap::Args;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::debug;

use robotarm_driver::{ArmError, ArmSession, ErrorPolicy, RusbBackend, UsbBackend};

use crate::keymap::{self, ShellAction};

const HISTORY_PATH: &str = ".robotarm_history";

/// Shell 参数
#[derive(Args, Debug, Clone)]
pub struct ShellOptions {
    /// 每次按键的运动时长（毫秒）
    #[arg(long, default_value_t = 250)]
    pub step_ms: u64,
}

/// REPL 会话（持有机械臂，退出时关闭）
pub struct ReplSession<B: UsbBackend = RusbBackend> {
    arm: ArmSession<B>,
    policy: ErrorPolicy,
    step: Duration,
}

impl<B: UsbBackend> ReplSession<B> {
    pub fn new(arm: ArmSession<B>, policy: ErrorPolicy, step: Duration) -> Self {
        Self { arm, policy, step }
    }

    /// 执行一个动作；返回 `false` 表示退出
    pub fn dispatch(&mut self, action: ShellAction) -> Result<bool, ArmError> {
        let result = match action {
            ShellAction::Move { motions, duration } => {
                let duration = duration.unwrap_or(self.step);
                debug!("Shell move {} for {:?}", motions, duration);
                self.arm.move_timed(motions, duration)
            },
            ShellAction::Stop => self.arm.stop(),
            ShellAction::Light(light) => self.arm.set_light(light),
            ShellAction::Status => {
                println!("{}", self.arm.state());
                Ok(())
            },
            ShellAction::Help => {
                println!("{}", keymap::HELP);
                Ok(())
            },
            ShellAction::Quit => return Ok(false),
        };

        if let Err(e) = &result {
            println!("❌ {}", e);
        }
        self.policy.apply(result)?;
        Ok(true)
    }

    /// 急停（Ctrl-C）
    pub fn interrupt(&mut self) -> Result<(), ArmError> {
        println!("🛑 停止");
        self.policy.apply(self.arm.stop())
    }

    /// 安全关闭机械臂
    pub fn close(self) {
        println!("⏳ 关闭机械臂...");
        self.arm.close();
        println!("✅ 已关闭");
    }
}

/// 运行 REPL，直到 `q`、Ctrl-D、设备断开或（`--strict` 下的）命令失败
pub fn run_repl(arm: ArmSession, policy: ErrorPolicy, options: &ShellOptions) -> Result<()> {
    // 定时运动期间终端不在 raw 模式，Ctrl-C 会直接结束进程；
    // 这里吞掉信号，让当前运动按时结束并停止
    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = Arc::clone(&interrupted);
        ctrlc::set_handler(move || interrupted.store(true, Ordering::SeqCst))
            .context("Failed to install Ctrl-C handler")?;
    }

    let mut rl = DefaultEditor::new().context("Failed to initialize readline")?;
    rl.load_history(HISTORY_PATH).ok(); // 首次运行没有历史文件

    let mut session = ReplSession::new(arm, policy, Duration::from_millis(options.step_ms));

    println!("RobotArm CLI v{} - 交互式 Shell", env!("CARGO_PKG_VERSION"));
    println!("输入 'help' 查看按键，'q' 退出");
    println!();

    let outcome = loop {
        if interrupted.swap(false, Ordering::SeqCst) {
            debug!("Ctrl-C received during a move");
        }

        match rl.readline("robotarm> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());

                let action = match keymap::parse_line(&line) {
                    Ok(action) => action,
                    Err(e) => {
                        println!("⚠️  {}", e);
                        continue;
                    },
                };
                match session.dispatch(action) {
                    Ok(true) => {},
                    Ok(false) => break Ok(()),
                    Err(e) => break Err(e),
                }
            },
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                if let Err(e) = session.interrupt() {
                    break Err(e);
                }
            },
            Err(ReadlineError::Eof) => break Ok(()),
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break Ok(());
            },
        }
    };

    rl.save_history(HISTORY_PATH).ok();
    session.close();
    outcome.map_err(Into::into)
}
