//! 运动命令
//!
//! 组合若干运动标志，驱动固定时长，或一直运动到 Ctrl-C。
//! 结束时总会发送停止命令并关闭会话。

use anyhow::Result;
use clap::Args;
use robotarm_driver::MotionFlags;
use std::time::Duration;

use crate::GlobalArgs;

/// 运动命令参数
#[derive(Args, Debug)]
pub struct MoveCommand {
    /// 运动标志，例如 `grip-open`、`base-cw|elbow-up`、`0x0104`
    #[arg(required = true, value_name = "FLAGS")]
    pub flags: Vec<MotionFlags>,

    /// 运动时长（毫秒）；省略则运动到 Ctrl-C
    #[arg(short, long)]
    pub duration_ms: Option<u64>,
}

impl MoveCommand {
    /// 所有参数按位或后的标志
    pub fn motions(&self) -> MotionFlags {
        self.flags.iter().fold(MotionFlags::STOP, |acc, flag| acc | *flag)
    }

    pub fn execute(&self, global: &GlobalArgs) -> Result<()> {
        let motions = self.motions();
        let policy = global.policy();
        let mut arm = global.connect()?;

        match self.duration_ms {
            Some(ms) => {
                println!("🦾 {} ({} ms)", motions, ms);
                policy.apply(arm.move_timed(motions, Duration::from_millis(ms)))?;
            },
            None => {
                println!("🦾 {}", motions);
                policy.apply(arm.move_arm(motions))?;
                super::wait_for_interrupt()?;
                policy.apply(arm.stop())?;
            },
        }

        arm.close();
        println!("✅ 完成");
        Ok(())
    }
}
