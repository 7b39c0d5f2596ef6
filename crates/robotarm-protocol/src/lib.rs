//! # RobotArm Protocol
//!
//! OWI 机械臂 USB 控制协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `constants`: USB 标识与控制传输常量
//! - `motion`: 运动标志位（可按位或组合）
//! - `state`: 设备状态缓冲区（3 字节命令）
//!
//! ## 线格式
//!
//! 设备只接受一种命令：一次 vendor 控制传输，负载固定 3 字节。
//!
//! ```text
//! Byte 0: 运动标志 bit 0-7  (夹爪 / 手腕 / 肘部 / 肩部)
//! Byte 1: 运动标志 bit 8-15 (底座)
//! Byte 2: 灯光（0 = 关，1 = 开）
//! ```
//!
//! 设备没有反馈通道，缓冲区只代表「最后一次下发」的状态。

use thiserror::Error;

pub mod constants;
pub mod motion;
pub mod state;

// 重新导出常用类型
pub use constants::*;
pub use motion::{Joint, MotionBits, MotionFlags};
pub use state::{DeviceState, Light};

/// 协议解析错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid command length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Invalid value for field {field}: {value}")]
    InvalidValue { field: String, value: u8 },

    #[error("Unknown motion: {0}")]
    UnknownMotion(String),

    #[error("Unknown light state: {0}")]
    UnknownLight(String),
}
