//! 停止命令
//!
//! 连接后立即发送停止命令，然后安全关闭（关灯）。

use anyhow::Result;
use clap::Args;

use crate::GlobalArgs;

/// 停止命令参数
#[derive(Args, Debug)]
pub struct StopCommand {}

impl StopCommand {
    pub fn execute(&self, global: &GlobalArgs) -> Result<()> {
        let mut arm = global.connect()?;

        println!("🛑 发送停止命令...");
        global.policy().apply(arm.stop())?;

        arm.close();
        println!("✅ 已停止");
        Ok(())
    }
}
