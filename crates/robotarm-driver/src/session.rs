//! 机械臂会话
//!
//! `ArmSession` 独占一个设备连接、一个 USB 上下文和一份设备状态缓冲区。
//! 每个修改状态的公开操作都以一次完整的 3 字节控制传输结束。

use std::fmt;
use std::time::Duration;
use tracing::{Level, debug, enabled, error, info, trace, warn};

use robotarm_protocol::{
    CONTROL_INDEX, CONTROL_REQUEST, CONTROL_REQUEST_TYPE, CONTROL_VALUE, DeviceState, Light,
    MotionFlags, ROBOTARM_PRODUCT_ID, ROBOTARM_VENDOR_ID,
};
use robotarm_usb::{ControlTransfer, RusbBackend, UsbBackend, UsbError};

use crate::builder::ArmBuilder;
use crate::error::ArmError;

/// 与一台机械臂的会话
///
/// 只能通过 [`ArmSession::find`]（或 [`ArmBuilder`]）创建，通过 [`ArmSession::close`]
/// 销毁。`close` 消费会话，关闭后的任何使用都无法通过编译。
///
/// 如果会话未经 `close` 就被 drop，`Drop` 会执行同样的安全关闭流程。
///
/// # 线程模型
///
/// 所有操作同步阻塞；修改操作需要 `&mut self`，不支持并发访问。
pub struct ArmSession<B: UsbBackend = RusbBackend> {
    // 字段按声明顺序 drop：先关闭连接，再销毁上下文
    connection: B::Connection,
    _context: B,
    state: DeviceState,
    command_timeout: Duration,
    closed: bool,
}

impl ArmSession<RusbBackend> {
    /// 扫描 USB 设备，打开第一台机械臂
    ///
    /// 返回的会话已将默认状态（静止、灯亮）同步到设备。
    pub fn find() -> Result<Self, ArmError> {
        ArmBuilder::new().find()
    }
}

impl<B: UsbBackend> ArmSession<B> {
    /// 发现流程
    ///
    /// 任一步骤失败时，已获取的资源（上下文、设备列表、句柄）都会在返回前释放。
    pub(crate) fn discover<F>(init: F, command_timeout: Duration) -> Result<Self, ArmError>
    where
        F: FnOnce() -> Result<B, UsbError>,
    {
        let context = init().map_err(|e| {
            error!("USB context initialization failed: {}", e);
            ArmError::ContextInit(e)
        })?;

        let devices = context.devices().map_err(|e| {
            error!("USB device enumeration failed: {}", e);
            ArmError::Enumerate(e)
        })?;
        debug!("Scanning {} USB devices for robot arm", devices.len());

        let mut found = None;
        for (index, device) in devices.iter().enumerate() {
            let ids = context.device_ids(device).map_err(|source| {
                error!("Failed to read descriptor of device #{}: {}", index, source);
                ArmError::Descriptor { index, source }
            })?;
            trace!("Device #{}: {}", index, ids);

            if ids.is_robotarm() {
                found = Some((index, device));
                break;
            }
        }

        let Some((index, device)) = found else {
            debug!("No robot arm among {} devices", devices.len());
            return Err(ArmError::NotFound {
                vendor_id: ROBOTARM_VENDOR_ID,
                product_id: ROBOTARM_PRODUCT_ID,
            });
        };

        let connection = context.open(device).map_err(|e| {
            error!("Failed to open robot arm (device #{}): {}", index, e);
            ArmError::Open(e)
        })?;

        // 打开后即可释放设备列表
        drop(devices);

        let session = Self {
            connection,
            _context: context,
            state: DeviceState::FACTORY_DEFAULT,
            command_timeout,
            closed: false,
        };

        // 同步默认状态；失败不影响会话创建
        if let Err(e) = session.transmit() {
            warn!("Initial state sync failed (session still usable): {}", e);
        }

        info!("Robot arm opened (device #{})", index);
        Ok(session)
    }

    /// 最后一次下发的状态
    pub fn state(&self) -> DeviceState {
        self.state
    }

    pub fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    /// 开始运动，直到下一次 `move_arm` 或 `stop`
    ///
    /// 覆盖两个运动字节，灯光不变。传输失败时立即尝试一次安全停止
    /// （不重试原命令），并返回错误。
    pub fn move_arm(&mut self, motions: MotionFlags) -> Result<(), ArmError> {
        if enabled!(Level::DEBUG) {
            let conflicts = motions.conflicting_joints();
            if !conflicts.is_empty() {
                debug!(
                    "Both directions requested for {:?}; firmware arbitrates",
                    conflicts
                );
            }
        }

        self.state.set_motions(motions);
        let command = match self.transmit() {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        warn!("Move {} failed: {}; attempting safety stop", motions, command);
        match self.send_stop() {
            Ok(()) => Err(ArmError::Transfer(command)),
            Err(stop) => Err(ArmError::SafetyStopFailed { command, stop }),
        }
    }

    /// 运动指定时长后停止（阻塞）
    ///
    /// 无论运动命令是否成功，等待结束后都会调用 `stop`，
    /// 返回时命令状态的运动字节一定为 0。不可中途取消。
    pub fn move_timed(&mut self, motions: MotionFlags, duration: Duration) -> Result<(), ArmError> {
        let moved = self.move_arm(motions);
        std::thread::sleep(duration);
        let stopped = self.stop();
        moved.and(stopped)
    }

    /// 停止所有运动，灯光不变（等价于 `move_arm(MotionFlags::STOP)`）
    pub fn stop(&mut self) -> Result<(), ArmError> {
        self.send_stop().map_err(ArmError::Transfer)
    }

    /// 设置灯光，运动不变
    pub fn set_light(&mut self, light: Light) -> Result<(), ArmError> {
        self.state.set_light(light);
        self.transmit().map_err(|e| {
            warn!("Setting light {} failed: {}", light, e);
            ArmError::Transfer(e)
        })
    }

    /// 关闭会话
    ///
    /// 先停止运动并关灯（尽力而为，错误只记录日志），再释放连接和 USB 上下文。
    pub fn close(mut self) {
        self.shutdown();
        // Drop 依次释放连接与上下文
    }

    fn send_stop(&mut self) -> Result<(), UsbError> {
        self.state.set_motions(MotionFlags::STOP);
        self.transmit().inspect_err(|e| {
            error!("Stop failed, caller is now responsible for the arm: {}", e);
        })
    }

    fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        // 错误已在各自路径上记录
        let _ = self.stop();
        let _ = self.set_light(Light::Off);
        debug!("Robot arm session closed");
    }

    /// 将整个状态缓冲区作为一次控制传输下发
    fn transmit(&self) -> Result<(), UsbError> {
        let payload = self.state.as_bytes();
        trace!("-> {}", self.state);

        let written = self.connection.write_control(
            CONTROL_REQUEST_TYPE,
            CONTROL_REQUEST,
            CONTROL_VALUE,
            CONTROL_INDEX,
            &payload,
            self.command_timeout,
        )?;

        if written < payload.len() {
            return Err(UsbError::ShortWrite {
                expected: payload.len(),
                actual: written,
            });
        }
        Ok(())
    }
}

// 后端和连接句柄不实现 Debug
impl<B: UsbBackend> fmt::Debug for ArmSession<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArmSession")
            .field("state", &self.state)
            .field("command_timeout", &self.command_timeout)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl<B: UsbBackend> Drop for ArmSession<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
