//! USB 传输错误类型

use thiserror::Error;

/// USB 传输错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsbError {
    /// USB 错误（来自 rusb）
    #[error("USB error: {0}")]
    Usb(#[from] rusb::Error),

    /// 设备接收的字节数少于负载长度
    #[error("Short write: expected {expected} bytes, device accepted {actual}")]
    ShortWrite { expected: usize, actual: usize },
}

impl UsbError {
    /// 设备已断开或无权限，后续命令不可能成功
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            UsbError::Usb(rusb::Error::NoDevice)
                | UsbError::Usb(rusb::Error::Access)
                | UsbError::Usb(rusb::Error::NotFound)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::UsbError;

    #[test]
    fn test_usb_error_from_rusb_error() {
        let err: UsbError = rusb::Error::Pipe.into();
        match err {
            UsbError::Usb(rusb::Error::Pipe) => {},
            _ => panic!("Expected Usb(Pipe) variant"),
        }
    }

    #[test]
    fn test_usb_error_is_fatal() {
        assert!(UsbError::Usb(rusb::Error::NoDevice).is_fatal());
        assert!(UsbError::Usb(rusb::Error::Access).is_fatal());
        assert!(!UsbError::Usb(rusb::Error::Timeout).is_fatal());
        assert!(
            !UsbError::ShortWrite {
                expected: 3,
                actual: 0
            }
            .is_fatal()
        );
    }

    #[test]
    fn test_usb_error_display() {
        let err = UsbError::ShortWrite {
            expected: 3,
            actual: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("Short write"));
        assert!(msg.contains('3'));
        assert!(msg.contains('1'));

        let err = UsbError::Usb(rusb::Error::Timeout);
        assert!(err.to_string().starts_with("USB error:"));
    }
}
