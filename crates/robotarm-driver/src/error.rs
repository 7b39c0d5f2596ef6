//! 驱动层错误类型定义

use robotarm_usb::UsbError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArmError {
    /// USB 库上下文初始化失败
    #[error("USB context initialization failed: {0}")]
    ContextInit(#[source] UsbError),

    /// 设备枚举失败
    #[error("USB device enumeration failed: {0}")]
    Enumerate(#[source] UsbError),

    /// 读取设备描述符失败（中止扫描）
    #[error("Failed to read descriptor of device #{index}: {source}")]
    Descriptor {
        index: usize,
        #[source]
        source: UsbError,
    },

    /// 没有匹配 VID/PID 的设备
    #[error("No robot arm found (VID {vendor_id:04x}, PID {product_id:04x})")]
    NotFound { vendor_id: u16, product_id: u16 },

    /// 打开设备失败（通常是权限问题）
    #[error("Failed to open robot arm: {0}")]
    Open(#[source] UsbError),

    /// 命令传输失败
    #[error("Command transfer failed: {0}")]
    Transfer(#[source] UsbError),

    /// 运动命令失败，随后的安全停止也失败
    ///
    /// 机械臂可能仍在运动，需要人工处理。
    #[error("Command transfer failed ({command}) and safety stop also failed ({stop})")]
    SafetyStopFailed { command: UsbError, stop: UsbError },
}

impl ArmError {
    /// 设备已断开或无权限，同一会话上的后续命令不可能成功
    pub fn is_fatal(&self) -> bool {
        match self {
            ArmError::Open(e) | ArmError::Transfer(e) => e.is_fatal(),
            ArmError::SafetyStopFailed { stop, .. } => stop.is_fatal(),
            _ => false,
        }
    }

    /// 机械臂可能仍在运动
    pub fn is_unsafe(&self) -> bool {
        matches!(self, ArmError::SafetyStopFailed { .. })
    }
}
