//! libusb 后端（通过 rusb）
//!
//! 每个 [`RusbBackend`] 拥有独立的 `rusb::Context`，作为库使用时不会干扰
//! 同一进程中其他使用 libusb 的代码。

use rusb::{Context, Device, DeviceHandle, UsbContext};
use std::time::Duration;
use tracing::trace;

use crate::{ControlTransfer, DeviceIds, UsbBackend, UsbError};

/// 基于 libusb 的 USB 后端
pub struct RusbBackend {
    context: Context,
}

impl RusbBackend {
    /// 初始化一个新的 libusb 上下文
    pub fn new() -> Result<Self, UsbError> {
        let context = Context::new()?;
        trace!("libusb context initialized");
        Ok(Self { context })
    }
}

impl UsbBackend for RusbBackend {
    type Device = Device<Context>;
    type Connection = RusbConnection;

    fn devices(&self) -> Result<Vec<Self::Device>, UsbError> {
        // DeviceList 在此处 drop（libusb_free_device_list），
        // 返回的 Device 各自持有引用计数
        let list = self.context.devices()?;
        Ok(list.iter().collect())
    }

    fn device_ids(&self, device: &Self::Device) -> Result<DeviceIds, UsbError> {
        let desc = device.device_descriptor()?;
        Ok(DeviceIds::new(desc.vendor_id(), desc.product_id()))
    }

    fn open(&self, device: &Self::Device) -> Result<Self::Connection, UsbError> {
        let handle = device.open()?;
        trace!(
            "Opened USB device at bus {:03} address {:03}",
            device.bus_number(),
            device.address()
        );
        Ok(RusbConnection {
            handle,
            bus_number: device.bus_number(),
            address: device.address(),
        })
    }
}

/// 已打开的 libusb 设备句柄
pub struct RusbConnection {
    handle: DeviceHandle<Context>,
    bus_number: u8,
    address: u8,
}

impl RusbConnection {
    pub fn bus_number(&self) -> u8 {
        self.bus_number
    }

    pub fn address(&self) -> u8 {
        self.address
    }
}

impl ControlTransfer for RusbConnection {
    fn write_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
        timeout: Duration,
    ) -> Result<usize, UsbError> {
        let written = self
            .handle
            .write_control(request_type, request, value, index, data, timeout)?;
        Ok(written)
    }
}

impl Drop for RusbConnection {
    fn drop(&mut self) {
        // DeviceHandle 自身的 Drop 负责 libusb_close
        trace!(
            "[Release] Closing USB handle (bus {:03} address {:03})",
            self.bus_number, self.address
        );
    }
}
