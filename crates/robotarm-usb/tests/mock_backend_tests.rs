//! Mock 后端集成测试
//!
//! 验证 MockUsb 的枚举顺序、错误注入和事件记录，驱动层测试依赖这些行为。

use robotarm_usb::{ControlTransfer, DeviceIds, MockDevice, MockEvent, MockUsb, UsbBackend, UsbError};
use std::time::Duration;

#[test]
fn test_enumeration_order_is_attach_order() {
    let usb = MockUsb::new();
    usb.attach(MockDevice::new(0x1267, 5))
        .attach(MockDevice::new(0x1267, 0));

    let backend = usb.init().unwrap();
    let devices = backend.devices().unwrap();
    assert_eq!(devices, vec![0, 1]);
    assert_eq!(backend.device_ids(&0).unwrap(), DeviceIds::new(0x1267, 5));
    assert!(backend.device_ids(&1).unwrap().is_robotarm());
}

#[test]
fn test_init_error() {
    let usb = MockUsb::new();
    usb.set_init_error(Some(UsbError::Usb(rusb::Error::Other)));
    assert!(usb.init().is_err());
    assert!(usb.events().is_empty());
}

#[test]
fn test_list_error() {
    let usb = MockUsb::new();
    usb.attach(MockDevice::robotarm());
    usb.set_list_error(Some(UsbError::Usb(rusb::Error::NoMem)));

    let backend = usb.init().unwrap();
    assert_eq!(backend.devices(), Err(UsbError::Usb(rusb::Error::NoMem)));
}

#[test]
fn test_descriptor_and_open_errors() {
    let usb = MockUsb::new();
    usb.attach(MockDevice::robotarm().with_descriptor_error(UsbError::Usb(rusb::Error::Io)))
        .attach(MockDevice::robotarm().with_open_error(UsbError::Usb(rusb::Error::Access)));

    let backend = usb.init().unwrap();
    assert!(backend.device_ids(&0).is_err());
    assert_eq!(usb.open_attempts(), 0);
    assert!(backend.open(&1).is_err());
    assert_eq!(usb.open_count(), 0);
    assert_eq!(usb.open_attempts(), 1);
}

#[test]
fn test_transfer_is_recorded_with_parameters() {
    let usb = MockUsb::new();
    usb.attach(MockDevice::robotarm());

    let backend = usb.init().unwrap();
    let conn = backend.open(&0).unwrap();
    conn.write_control(0x40, 6, 0x0100, 0, &[0x05, 0x00, 0x01], Duration::from_millis(500))
        .unwrap();

    let transfer = usb
        .events()
        .into_iter()
        .find(|e| matches!(e, MockEvent::Transfer { .. }))
        .unwrap();
    assert_eq!(
        transfer,
        MockEvent::Transfer {
            device: 0,
            request_type: 0x40,
            request: 6,
            value: 0x0100,
            index: 0,
            data: vec![0x05, 0x00, 0x01],
            timeout: Duration::from_millis(500),
        }
    );
    assert_eq!(usb.last_payload(), Some(vec![0x05, 0x00, 0x01]));
}

#[test]
fn test_persistent_transfer_error() {
    let usb = MockUsb::new();
    usb.attach(MockDevice::robotarm());
    usb.set_transfer_error(Some(UsbError::Usb(rusb::Error::Timeout)));

    let backend = usb.init().unwrap();
    let conn = backend.open(&0).unwrap();
    for _ in 0..3 {
        let err = conn
            .write_control(0x40, 6, 0x0100, 0, &[0, 0, 0], Duration::from_millis(1))
            .unwrap_err();
        assert_eq!(err, UsbError::Usb(rusb::Error::Timeout));
    }

    usb.set_transfer_error(None);
    assert!(conn.write_control(0x40, 6, 0x0100, 0, &[0, 0, 0], Duration::from_millis(1)).is_ok());
    assert_eq!(usb.transfer_count(), 4);
}

#[test]
fn test_context_release_recorded() {
    let usb = MockUsb::new();
    {
        let _backend = usb.init().unwrap();
        assert!(!usb.context_released());
    }
    assert!(usb.context_released());
}
