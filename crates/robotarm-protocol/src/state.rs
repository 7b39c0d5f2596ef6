//! 设备状态缓冲区
//!
//! 保存机械臂的完整命令状态（运动 + 灯光）。整个缓冲区总是作为一个
//! 3 字节单元下发，这样修改灯光不会打断运动，反之亦然。

use std::fmt;
use std::str::FromStr;

use crate::constants::COMMAND_LEN;
use crate::motion::MotionFlags;
use crate::ProtocolError;

/// 灯光状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Light {
    Off = 0,
    On = 1,
}

impl TryFrom<u8> for Light {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Light::Off),
            1 => Ok(Light::On),
            _ => Err(ProtocolError::InvalidValue {
                field: "light".to_string(),
                value,
            }),
        }
    }
}

impl From<Light> for u8 {
    fn from(light: Light) -> Self {
        light as u8
    }
}

impl From<bool> for Light {
    fn from(on: bool) -> Self {
        if on { Light::On } else { Light::Off }
    }
}

impl FromStr for Light {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on" | "1" | "true" => Ok(Light::On),
            "off" | "0" | "false" => Ok(Light::Off),
            other => Err(ProtocolError::UnknownLight(other.to_string())),
        }
    }
}

impl fmt::Display for Light {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Light::Off => f.write_str("off"),
            Light::On => f.write_str("on"),
        }
    }
}

/// 3 字节命令缓冲区
///
/// - Byte 0: 运动标志低字节
/// - Byte 1: 运动标志高字节
/// - Byte 2: 灯光
///
/// 反映的是最后一次下发的命令，不是机械臂的真实物理状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceState {
    motion_low: u8,
    motion_high: u8,
    light: Light,
}

impl DeviceState {
    /// 设备上电默认状态：静止，灯亮
    pub const FACTORY_DEFAULT: Self = Self {
        motion_low: 0,
        motion_high: 0,
        light: Light::On,
    };

    /// 关闭会话前的最终状态：静止，灯灭
    pub const SHUTDOWN: Self = Self {
        motion_low: 0,
        motion_high: 0,
        light: Light::Off,
    };

    pub const fn new(motions: MotionFlags, light: Light) -> Self {
        Self {
            motion_low: motions.low_byte(),
            motion_high: motions.high_byte(),
            light,
        }
    }

    /// 覆盖两个运动字节，灯光不变
    pub fn set_motions(&mut self, motions: MotionFlags) {
        self.motion_low = motions.low_byte();
        self.motion_high = motions.high_byte();
    }

    /// 覆盖灯光字节，运动不变
    pub fn set_light(&mut self, light: Light) {
        self.light = light;
    }

    pub fn motions(&self) -> MotionFlags {
        MotionFlags::from_bytes(self.motion_low, self.motion_high)
    }

    pub fn motion_low(&self) -> u8 {
        self.motion_low
    }

    pub fn motion_high(&self) -> u8 {
        self.motion_high
    }

    pub fn light(&self) -> Light {
        self.light
    }

    pub fn is_moving(&self) -> bool {
        self.motion_low != 0 || self.motion_high != 0
    }

    /// 序列化为控制传输负载
    pub fn as_bytes(&self) -> [u8; COMMAND_LEN] {
        [self.motion_low, self.motion_high, self.light.into()]
    }

    /// 从控制传输负载解析
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let bytes: [u8; COMMAND_LEN] =
            bytes.try_into().map_err(|_| ProtocolError::InvalidLength {
                expected: COMMAND_LEN,
                actual: bytes.len(),
            })?;

        Ok(Self {
            motion_low: bytes[0],
            motion_high: bytes[1],
            light: Light::try_from(bytes[2])?,
        })
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::FACTORY_DEFAULT
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [b0, b1, b2] = self.as_bytes();
        write!(
            f,
            "[{:02X} {:02X} {:02X}] motion={} light={}",
            b0,
            b1,
            b2,
            self.motions(),
            self.light
        )
    }
}
