//! Mock USB 后端
//!
//! 用于测试的模拟 USB 总线：可配置枚举结果、描述符/打开/传输错误，
//! 并按时间顺序记录所有操作，便于断言资源释放顺序。
//!
//! ```rust
//! use robotarm_usb::{MockDevice, MockUsb, UsbBackend};
//!
//! let usb = MockUsb::new();
//! usb.attach(MockDevice::robotarm());
//!
//! let backend = usb.init().unwrap();
//! let devices = backend.devices().unwrap();
//! assert_eq!(devices.len(), 1);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use robotarm_protocol::{ROBOTARM_PRODUCT_ID, ROBOTARM_VENDOR_ID};

use crate::{ControlTransfer, DeviceIds, UsbBackend, UsbError};

/// 模拟设备
#[derive(Debug, Clone)]
pub struct MockDevice {
    pub ids: DeviceIds,
    /// 读取描述符时返回的错误
    pub descriptor_error: Option<UsbError>,
    /// 打开时返回的错误
    pub open_error: Option<UsbError>,
}

impl MockDevice {
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            ids: DeviceIds::new(vendor_id, product_id),
            descriptor_error: None,
            open_error: None,
        }
    }

    /// VID/PID 匹配的机械臂
    pub fn robotarm() -> Self {
        Self::new(ROBOTARM_VENDOR_ID, ROBOTARM_PRODUCT_ID)
    }

    pub fn with_descriptor_error(mut self, error: UsbError) -> Self {
        self.descriptor_error = Some(error);
        self
    }

    pub fn with_open_error(mut self, error: UsbError) -> Self {
        self.open_error = Some(error);
        self
    }
}

/// 按发生顺序记录的总线事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    ContextCreated,
    DevicesListed,
    DescriptorRead { device: usize },
    Opened { device: usize },
    Transfer {
        device: usize,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: Vec<u8>,
        timeout: Duration,
    },
    Closed { device: usize },
    ContextReleased,
}

#[derive(Debug, Default)]
struct MockState {
    devices: Vec<MockDevice>,
    init_error: Option<UsbError>,
    list_error: Option<UsbError>,
    /// 依次消费的一次性传输错误
    queued_transfer_errors: VecDeque<UsbError>,
    /// 按传输序号（从 1 开始）安排的错误
    scheduled_transfer_errors: Vec<(usize, UsbError)>,
    /// 已发生的传输次数
    transfers_seen: usize,
    /// `open` 调用次数（包括失败的调用）
    open_attempts: usize,
    /// 持续生效的传输错误
    transfer_error: Option<UsbError>,
    /// 设备只接受前 N 个字节
    short_write: Option<usize>,
    events: Vec<MockEvent>,
}

/// 模拟 USB 总线（测试侧句柄）
///
/// 克隆共享同一个总线状态。
#[derive(Debug, Clone, Default)]
pub struct MockUsb {
    state: Arc<Mutex<MockState>>,
}

impl MockUsb {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        lock_state(&self.state)
    }

    /// 挂载设备（追加到枚举顺序末尾）
    pub fn attach(&self, device: MockDevice) -> &Self {
        self.lock().devices.push(device);
        self
    }

    pub fn set_init_error(&self, error: Option<UsbError>) {
        self.lock().init_error = error;
    }

    pub fn set_list_error(&self, error: Option<UsbError>) {
        self.lock().list_error = error;
    }

    /// 之后的每一次传输都失败（`None` 恢复正常）
    pub fn set_transfer_error(&self, error: Option<UsbError>) {
        self.lock().transfer_error = error;
    }

    /// 下一次传输失败（可多次调用排队）
    pub fn fail_next_transfer(&self, error: UsbError) {
        self.lock().queued_transfer_errors.push_back(error);
    }

    /// 从现在起第 `n` 次传输失败（`n` 从 1 开始）
    pub fn fail_nth_transfer(&self, n: usize, error: UsbError) {
        let mut state = self.lock();
        let at = state.transfers_seen + n;
        state.scheduled_transfer_errors.push((at, error));
    }

    pub fn set_short_write(&self, accepted: Option<usize>) {
        self.lock().short_write = accepted;
    }

    /// 创建一个新的后端上下文（对应 libusb_init）
    pub fn init(&self) -> Result<MockBackend, UsbError> {
        let mut state = self.lock();
        if let Some(error) = state.init_error.clone() {
            return Err(error);
        }
        state.events.push(MockEvent::ContextCreated);
        Ok(MockBackend {
            state: Arc::clone(&self.state),
        })
    }

    pub fn events(&self) -> Vec<MockEvent> {
        self.lock().events.clone()
    }

    pub fn clear_events(&self) {
        self.lock().events.clear();
    }

    /// 已成功打开的设备序号
    pub fn opened_devices(&self) -> Vec<usize> {
        self.lock()
            .events
            .iter()
            .filter_map(|event| match event {
                MockEvent::Opened { device } => Some(*device),
                _ => None,
            })
            .collect()
    }

    pub fn open_count(&self) -> usize {
        self.opened_devices().len()
    }

    /// `open` 被调用的次数（包括返回错误的调用）
    pub fn open_attempts(&self) -> usize {
        self.lock().open_attempts
    }

    /// 所有传输负载（包括失败的传输）
    pub fn payloads(&self) -> Vec<Vec<u8>> {
        self.lock()
            .events
            .iter()
            .filter_map(|event| match event {
                MockEvent::Transfer { data, .. } => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_payload(&self) -> Option<Vec<u8>> {
        self.payloads().pop()
    }

    pub fn transfer_count(&self) -> usize {
        self.payloads().len()
    }

    pub fn context_released(&self) -> bool {
        self.lock().events.contains(&MockEvent::ContextReleased)
    }
}

fn lock_state(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    // 测试线程 panic 后仍允许检查记录
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// 模拟后端上下文
#[derive(Debug)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl UsbBackend for MockBackend {
    /// 设备在枚举列表中的序号
    type Device = usize;
    type Connection = MockConnection;

    fn devices(&self) -> Result<Vec<Self::Device>, UsbError> {
        let mut state = lock_state(&self.state);
        if let Some(error) = state.list_error.clone() {
            return Err(error);
        }
        state.events.push(MockEvent::DevicesListed);
        Ok((0..state.devices.len()).collect())
    }

    fn device_ids(&self, device: &Self::Device) -> Result<DeviceIds, UsbError> {
        let mut state = lock_state(&self.state);
        state.events.push(MockEvent::DescriptorRead { device: *device });
        let mock = state
            .devices
            .get(*device)
            .ok_or(UsbError::Usb(rusb::Error::NoDevice))?;
        match &mock.descriptor_error {
            Some(error) => Err(error.clone()),
            None => Ok(mock.ids),
        }
    }

    fn open(&self, device: &Self::Device) -> Result<Self::Connection, UsbError> {
        let mut state = lock_state(&self.state);
        state.open_attempts += 1;
        let mock = state
            .devices
            .get(*device)
            .ok_or(UsbError::Usb(rusb::Error::NoDevice))?;
        if let Some(error) = mock.open_error.clone() {
            return Err(error);
        }
        state.events.push(MockEvent::Opened { device: *device });
        Ok(MockConnection {
            state: Arc::clone(&self.state),
            device: *device,
        })
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        lock_state(&self.state).events.push(MockEvent::ContextReleased);
    }
}

/// 模拟设备连接
#[derive(Debug)]
pub struct MockConnection {
    state: Arc<Mutex<MockState>>,
    device: usize,
}

impl ControlTransfer for MockConnection {
    fn write_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
        timeout: Duration,
    ) -> Result<usize, UsbError> {
        let mut state = lock_state(&self.state);
        state.events.push(MockEvent::Transfer {
            device: self.device,
            request_type,
            request,
            value,
            index,
            data: data.to_vec(),
            timeout,
        });
        state.transfers_seen += 1;

        let seen = state.transfers_seen;
        if let Some(pos) = state
            .scheduled_transfer_errors
            .iter()
            .position(|(at, _)| *at == seen)
        {
            let (_, error) = state.scheduled_transfer_errors.remove(pos);
            return Err(error);
        }
        if let Some(error) = state.queued_transfer_errors.pop_front() {
            return Err(error);
        }
        if let Some(error) = state.transfer_error.clone() {
            return Err(error);
        }
        Ok(state.short_write.map_or(data.len(), |n| n.min(data.len())))
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        lock_state(&self.state)
            .events
            .push(MockEvent::Closed { device: self.device });
    }
}
