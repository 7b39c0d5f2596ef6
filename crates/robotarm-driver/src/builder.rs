//! Builder 模式实现
//!
//! 提供链式构造 `ArmSession` 实例的便捷方式。

use std::time::Duration;

use robotarm_protocol::COMMAND_TIMEOUT_MS;
use robotarm_usb::{RusbBackend, UsbBackend, UsbError};

use crate::error::ArmError;
use crate::session::ArmSession;

/// ArmSession Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use robotarm_driver::ArmBuilder;
/// use std::time::Duration;
///
/// // 使用默认配置（500ms 传输超时）
/// let arm = ArmBuilder::new().find().unwrap();
///
/// // 自定义传输超时
/// let arm = ArmBuilder::new()
///     .command_timeout(Duration::from_millis(200))
///     .find()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ArmBuilder {
    /// 单次控制传输超时
    command_timeout: Duration,
}

impl ArmBuilder {
    pub fn new() -> Self {
        Self {
            command_timeout: Duration::from_millis(COMMAND_TIMEOUT_MS),
        }
    }

    /// 设置控制传输超时（可选，默认 500ms）
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// 通过 libusb 查找并打开机械臂
    pub fn find(self) -> Result<ArmSession<RusbBackend>, ArmError> {
        self.find_with(RusbBackend::new)
    }

    /// 使用自定义后端查找并打开机械臂
    ///
    /// `init` 负责创建后端上下文，每次调用都会得到一个独立的上下文。
    pub fn find_with<B, F>(self, init: F) -> Result<ArmSession<B>, ArmError>
    where
        B: UsbBackend,
        F: FnOnce() -> Result<B, UsbError>,
    {
        ArmSession::discover(init, self.command_timeout)
    }
}

impl Default for ArmBuilder {
    fn default() -> Self {
        Self::new()
    }
}
