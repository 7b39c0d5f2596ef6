//! 协议常量定义
//!
//! 这些值由设备固件决定，不可协商。

// ============================================================================
// USB Identification
// ============================================================================

/// OWI Robotic Arm Edge 厂商 ID
pub const ROBOTARM_VENDOR_ID: u16 = 0x1267;
/// OWI Robotic Arm Edge 产品 ID
pub const ROBOTARM_PRODUCT_ID: u16 = 0x0000;

// ============================================================================
// Control Transfer
// ============================================================================

/// bmRequestType: host-to-device | vendor | device recipient
pub const CONTROL_REQUEST_TYPE: u8 = 0x40;
/// bRequest（设备自定义）
pub const CONTROL_REQUEST: u8 = 6;
/// wValue（设备自定义）
pub const CONTROL_VALUE: u16 = 0x0100;
/// wIndex
pub const CONTROL_INDEX: u16 = 0;

/// 命令负载长度（字节）
pub const COMMAND_LEN: usize = 3;

/// 单次控制传输超时（毫秒）
pub const COMMAND_TIMEOUT_MS: u64 = 500;

/// 判断 VID/PID 是否为机械臂
pub fn is_robotarm_device(vendor_id: u16, product_id: u16) -> bool {
    vendor_id == ROBOTARM_VENDOR_ID && product_id == ROBOTARM_PRODUCT_ID
}
