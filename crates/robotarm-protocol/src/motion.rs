//! 运动标志位
//!
//! 每个关节占用两个相邻的 bit（两个方向），可按位或组合以同时驱动多个关节。
//!
//! ```text
//!            | Byte 0                          | Byte 1        |
//! bit        | 7   6   5   4   3   2   1   0   | 15..10  9   8 |
//! 关节       | shoulder elbow   wrist   grip   | reserved base |
//! ```
//!
//! 本层不校验「冲突」组合（例如同时张开和闭合夹爪），由设备固件仲裁。

use bilge::prelude::*;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

use crate::ProtocolError;

/// 运动标志集合（线格式兼容）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct MotionFlags(u16);

impl MotionFlags {
    /// 停止所有运动
    pub const STOP: Self = Self(0);
    pub const GRIP_CLOSE: Self = Self(0x0001);
    pub const GRIP_OPEN: Self = Self(0x0002);
    pub const WRIST_UP: Self = Self(0x0004);
    pub const WRIST_DOWN: Self = Self(0x0008);
    pub const ELBOW_UP: Self = Self(0x0010);
    pub const ELBOW_DOWN: Self = Self(0x0020);
    pub const SHOULDER_BACK: Self = Self(0x0040);
    pub const SHOULDER_FWD: Self = Self(0x0080);
    pub const BASE_CW: Self = Self(0x0100);
    pub const BASE_CCW: Self = Self(0x0200);

    /// 所有已定义标志的并集
    pub const ALL: Self = Self(0x03FF);

    /// 名称表（按 bit 顺序）
    const NAMED: [(&'static str, MotionFlags); 10] = [
        ("grip-close", Self::GRIP_CLOSE),
        ("grip-open", Self::GRIP_OPEN),
        ("wrist-up", Self::WRIST_UP),
        ("wrist-down", Self::WRIST_DOWN),
        ("elbow-up", Self::ELBOW_UP),
        ("elbow-down", Self::ELBOW_DOWN),
        ("shoulder-back", Self::SHOULDER_BACK),
        ("shoulder-fwd", Self::SHOULDER_FWD),
        ("base-cw", Self::BASE_CW),
        ("base-ccw", Self::BASE_CCW),
    ];

    /// 从原始 bit 构造（保留未定义的 bit，不做校验）
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// 从两个命令字节构造
    pub const fn from_bytes(low: u8, high: u8) -> Self {
        Self(u16::from_le_bytes([low, high]))
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    /// 命令 Byte 0
    pub const fn low_byte(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// 命令 Byte 1
    pub const fn high_byte(self) -> u8 {
        ((self.0 >> 8) & 0xFF) as u8
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// 已置位的标志名称（按 bit 顺序）
    pub fn iter_names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMED
            .into_iter()
            .filter(move |(_, flag)| self.contains(*flag))
            .map(|(name, _)| name)
    }

    /// 同时请求了两个方向的关节
    pub fn conflicting_joints(self) -> Vec<Joint> {
        let bits = MotionBits::from(self.0);
        Joint::ALL
            .into_iter()
            .filter(|joint| bits.drive(*joint) == 0b11)
            .collect()
    }
}

impl From<u16> for MotionFlags {
    fn from(bits: u16) -> Self {
        Self(bits)
    }
}

impl From<MotionFlags> for u16 {
    fn from(flags: MotionFlags) -> Self {
        flags.0
    }
}

impl BitOr for MotionFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for MotionFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for MotionFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("stop");
        }

        let mut first = true;
        for name in self.iter_names() {
            if !first {
                f.write_str("|")?;
            }
            f.write_str(name)?;
            first = false;
        }

        let unknown = self.0 & !Self::ALL.0;
        if unknown != 0 {
            if !first {
                f.write_str("|")?;
            }
            write!(f, "0x{:04X}", unknown)?;
        }
        Ok(())
    }
}

/// 解析运动描述
///
/// 支持以 `|`、`,` 或 `+` 分隔的名称（`grip-open|base-cw`），
/// 也接受 `stop`、十六进制（`0x0104`）和十进制原始值。
impl FromStr for MotionFlags {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ProtocolError::UnknownMotion(String::new()));
        }

        let mut flags = MotionFlags::STOP;
        for token in s.split(['|', ',', '+']).map(str::trim) {
            flags |= parse_token(token)?;
        }
        Ok(flags)
    }
}

fn parse_token(token: &str) -> Result<MotionFlags, ProtocolError> {
    let normalized = token.to_ascii_lowercase().replace('_', "-");

    if normalized == "stop" {
        return Ok(MotionFlags::STOP);
    }

    if let Some((_, flag)) = MotionFlags::NAMED
        .iter()
        .find(|(name, _)| *name == normalized)
    {
        return Ok(*flag);
    }

    let parsed = match normalized.strip_prefix("0x") {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => normalized.parse::<u16>(),
    };
    parsed
        .map(MotionFlags::from_bits)
        .map_err(|_| ProtocolError::UnknownMotion(token.to_string()))
}

/// 机械臂关节
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Joint {
    Grip,
    Wrist,
    Elbow,
    Shoulder,
    Base,
}

impl Joint {
    pub const ALL: [Joint; 5] = [
        Joint::Grip,
        Joint::Wrist,
        Joint::Elbow,
        Joint::Shoulder,
        Joint::Base,
    ];
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Joint::Grip => "grip",
            Joint::Wrist => "wrist",
            Joint::Elbow => "elbow",
            Joint::Shoulder => "shoulder",
            Joint::Base => "base",
        };
        f.write_str(name)
    }
}

/// 按关节拆分的位域视图
///
/// 每个关节 2 bit：`0b01` / `0b10` 为两个方向，`0b11` 为冲突请求。
/// - Bit 0-1: 夹爪（01 闭合，10 张开）
/// - Bit 2-3: 手腕（01 上，10 下）
/// - Bit 4-5: 肘部（01 上，10 下）
/// - Bit 6-7: 肩部（01 后，10 前）
/// - Bit 8-9: 底座（01 顺时针，10 逆时针）
/// - Bit 10-15: 保留
#[bitsize(16)]
#[derive(FromBits, DebugBits, Clone, Copy, PartialEq)]
pub struct MotionBits {
    pub grip: u2,
    pub wrist: u2,
    pub elbow: u2,
    pub shoulder: u2,
    pub base: u2,
    pub reserved: u6,
}

impl MotionBits {
    /// 指定关节的 2 bit 驱动值
    pub fn drive(&self, joint: Joint) -> u8 {
        match joint {
            Joint::Grip => self.grip().value(),
            Joint::Wrist => self.wrist().value(),
            Joint::Elbow => self.elbow().value(),
            Joint::Shoulder => self.shoulder().value(),
            Joint::Base => self.base().value(),
        }
    }
}

impl From<MotionFlags> for MotionBits {
    fn from(flags: MotionFlags) -> Self {
        MotionBits::from(flags.bits())
    }
}
