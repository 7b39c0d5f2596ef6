//! # RobotArm USB Transport Layer
//!
//! USB 主机访问抽象，提供设备枚举、描述符读取、打开设备以及同步控制传输。
//!
//! 驱动层只依赖 [`UsbBackend`] / [`ControlTransfer`] 两个 trait，不直接操作 libusb：
//!
//! ```text
//! Driver Layer (robotarm-driver)
//!     ↓ UsbBackend::devices() / device_ids() / open()
//! Transport Layer (此 crate)
//!     ↓ RusbBackend（libusb）或 MockBackend（测试）
//! Hardware
//! ```
//!
//! # 资源释放
//!
//! 所有资源都通过 `Drop` 释放（RAII）：
//! - 连接（`Connection`）drop 时关闭设备句柄
//! - 设备列表（`Vec<Device>`）drop 时释放引用计数
//! - 后端（上下文）drop 时销毁 libusb context
//!
//! 因此任何提前返回的错误路径都不会泄漏资源。

use std::fmt;
use std::time::Duration;

mod error;
pub mod rusb_backend;

#[cfg(feature = "mock")]
pub mod mock;

pub use error::UsbError;
pub use rusb_backend::{RusbBackend, RusbConnection};

#[cfg(feature = "mock")]
pub use mock::{MockBackend, MockConnection, MockDevice, MockEvent, MockUsb};

/// 设备描述符中的 VID/PID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceIds {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl DeviceIds {
    pub const fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }

    /// 是否为 OWI 机械臂
    pub fn is_robotarm(&self) -> bool {
        robotarm_protocol::is_robotarm_device(self.vendor_id, self.product_id)
    }
}

impl fmt::Display for DeviceIds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

/// 已打开设备连接上的同步控制传输
pub trait ControlTransfer {
    /// 执行 OUT 方向控制传输，返回设备实际接收的字节数
    fn write_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
        timeout: Duration,
    ) -> Result<usize, UsbError>;
}

/// USB 主机后端（持有一个独立的库上下文）
///
/// 每个会话拥有自己的后端实例，不共享全局上下文。
pub trait UsbBackend {
    /// 枚举得到的设备引用
    type Device;
    /// 已打开的设备连接
    type Connection: ControlTransfer;

    /// 枚举当前连接的所有设备（按枚举顺序）
    fn devices(&self) -> Result<Vec<Self::Device>, UsbError>;

    /// 读取设备描述符中的 VID/PID
    fn device_ids(&self, device: &Self::Device) -> Result<DeviceIds, UsbError>;

    /// 打开设备
    fn open(&self, device: &Self::Device) -> Result<Self::Connection, UsbError>;
}
