//! 驱动层模块
//!
//! 本模块提供 OWI 机械臂的会话驱动，包括：
//! - 设备发现（按固定 VID/PID 扫描并打开第一个匹配设备）
//! - 设备状态缓冲区（运动 + 灯光，始终整体下发）
//! - 运动 / 定时运动 / 停止 / 灯光控制
//! - 安全关闭（停止运动、关灯后再释放连接）
//!
//! # 使用示例
//!
//! ```no_run
//! use robotarm_driver::{ArmSession, Light, MotionFlags};
//! use std::time::Duration;
//!
//! let mut arm = ArmSession::find()?;
//! arm.move_timed(MotionFlags::GRIP_OPEN, Duration::from_millis(250))?;
//! arm.set_light(Light::Off)?;
//! arm.close();
//! # Ok::<(), robotarm_driver::ArmError>(())
//! ```
//!
//! # 错误处理
//!
//! 所有操作都返回 `Result`。驱动本身不会因为单次命令失败而中止，
//! 是否继续由调用方通过 [`ErrorPolicy`] 决定。

mod builder;
mod error;
pub mod policy;
mod session;

pub use builder::ArmBuilder;
pub use error::ArmError;
pub use policy::ErrorPolicy;
pub use session::ArmSession;

// 重新导出协议层和传输层常用类型
pub use robotarm_protocol::{DeviceState, Joint, Light, MotionFlags};
pub use robotarm_usb::{RusbBackend, UsbBackend, UsbError};
