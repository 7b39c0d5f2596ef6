//! 灯光命令
//!
//! 关闭会话时灯光总会熄灭，因此 `light on` 会保持指定时长（或到 Ctrl-C）。

use anyhow::Result;
use clap::Args;
use robotarm_driver::Light;

use crate::GlobalArgs;

/// 灯光命令参数
#[derive(Args, Debug)]
pub struct LightCommand {
    /// `on` 或 `off`
    pub state: Light,

    /// 保持时长（毫秒）；省略则保持到 Ctrl-C
    #[arg(short, long)]
    pub duration_ms: Option<u64>,
}

impl LightCommand {
    pub fn execute(&self, global: &GlobalArgs) -> Result<()> {
        let mut arm = global.connect()?;

        println!("💡 light {}", self.state);
        global.policy().apply(arm.set_light(self.state))?;
        if self.state == Light::On {
            super::hold(self.duration_ms)?;
        }

        arm.close();
        println!("✅ 完成");
        Ok(())
    }
}
