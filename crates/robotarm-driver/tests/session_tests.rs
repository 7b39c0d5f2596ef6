//! ArmSession 集成测试
//!
//! 使用 MockUsb 模拟 USB 总线，覆盖：
//! - 设备发现（匹配、未找到、各阶段失败时的资源释放）
//! - 运动 / 停止 / 灯光命令的线格式
//! - 运动失败时的安全停止
//! - 定时运动与关闭流程

use robotarm_driver::{ArmBuilder, ArmError, ArmSession, ErrorPolicy, Light, MotionFlags};
use robotarm_usb::{MockBackend, MockDevice, MockEvent, MockUsb, UsbError};
use std::time::{Duration, Instant};

fn pipe_error() -> UsbError {
    UsbError::Usb(rusb::Error::Pipe)
}

fn find(usb: &MockUsb) -> Result<ArmSession<MockBackend>, ArmError> {
    ArmBuilder::new().find_with(|| usb.init())
}

fn open_arm() -> (MockUsb, ArmSession<MockBackend>) {
    let usb = MockUsb::new();
    usb.attach(MockDevice::robotarm());
    let arm = find(&usb).unwrap();
    (usb, arm)
}

// ============================================================================
// Discovery
// ============================================================================

#[test]
fn test_find_opens_first_exact_match_only() {
    let usb = MockUsb::new();
    usb.attach(MockDevice::new(0x1267, 5))
        .attach(MockDevice::new(0x1267, 0))
        .attach(MockDevice::new(0x1267, 0));

    let arm = find(&usb).unwrap();

    assert_eq!(usb.opened_devices(), vec![1]);
    // 第三个设备的描述符从未被读取
    assert!(!usb.events().contains(&MockEvent::DescriptorRead { device: 2 }));
    assert_eq!(usb.payloads(), vec![vec![0x00, 0x00, 0x01]]);
    assert_eq!(arm.state().as_bytes(), [0x00, 0x00, 0x01]);
}

#[test]
fn test_find_not_found_opens_nothing() {
    let usb = MockUsb::new();
    usb.attach(MockDevice::new(0x1267, 5))
        .attach(MockDevice::new(0x1D50, 0x606F));

    let err = find(&usb).unwrap_err();

    assert_eq!(
        err,
        ArmError::NotFound {
            vendor_id: 0x1267,
            product_id: 0
        }
    );
    assert_eq!(usb.open_attempts(), 0);
    assert!(usb.context_released());
}

#[test]
fn test_find_with_empty_bus() {
    let usb = MockUsb::new();
    assert!(matches!(find(&usb), Err(ArmError::NotFound { .. })));
    assert!(usb.context_released());
}

#[test]
fn test_find_context_init_failure() {
    let usb = MockUsb::new();
    usb.attach(MockDevice::robotarm());
    usb.set_init_error(Some(UsbError::Usb(rusb::Error::Other)));

    let err = find(&usb).unwrap_err();
    assert!(matches!(err, ArmError::ContextInit(_)));
    assert!(usb.events().is_empty());
}

#[test]
fn test_find_enumeration_failure_releases_context() {
    let usb = MockUsb::new();
    usb.attach(MockDevice::robotarm());
    usb.set_list_error(Some(UsbError::Usb(rusb::Error::NoMem)));

    let err = find(&usb).unwrap_err();
    assert!(matches!(err, ArmError::Enumerate(_)));
    assert!(usb.context_released());
}

#[test]
fn test_find_descriptor_failure_stops_scan() {
    let usb = MockUsb::new();
    usb.attach(MockDevice::new(0x0001, 0x0001).with_descriptor_error(UsbError::Usb(rusb::Error::Io)))
        .attach(MockDevice::robotarm());

    let err = find(&usb).unwrap_err();

    assert!(matches!(err, ArmError::Descriptor { index: 0, .. }));
    assert_eq!(usb.open_attempts(), 0);
    assert!(!usb.events().contains(&MockEvent::DescriptorRead { device: 1 }));
    assert!(usb.context_released());
}

#[test]
fn test_find_open_failure_releases_context() {
    let usb = MockUsb::new();
    usb.attach(MockDevice::robotarm().with_open_error(UsbError::Usb(rusb::Error::Access)));

    let err = find(&usb).unwrap_err();

    assert_eq!(err, ArmError::Open(UsbError::Usb(rusb::Error::Access)));
    assert_eq!(usb.open_attempts(), 1);
    assert_eq!(usb.open_count(), 0);
    assert_eq!(usb.transfer_count(), 0);
    assert!(usb.context_released());
}

#[test]
fn test_find_survives_initial_sync_failure() {
    let usb = MockUsb::new();
    usb.attach(MockDevice::robotarm());
    usb.fail_next_transfer(pipe_error());

    let mut arm = find(&usb).expect("initial sync failure must not fail discovery");

    assert_eq!(usb.transfer_count(), 1);
    assert_eq!(arm.state().as_bytes(), [0x00, 0x00, 0x01]);
    arm.move_arm(MotionFlags::WRIST_DOWN).unwrap();
    assert_eq!(usb.last_payload(), Some(vec![0x08, 0x00, 0x01]));
}

#[test]
fn test_independent_sessions_own_their_context() {
    let usb_a = MockUsb::new();
    usb_a.attach(MockDevice::robotarm());
    let usb_b = MockUsb::new();
    usb_b.attach(MockDevice::robotarm());

    let arm_a = find(&usb_a).unwrap();
    let arm_b = find(&usb_b).unwrap();

    arm_a.close();
    assert!(usb_a.context_released());
    assert!(!usb_b.context_released());
    arm_b.close();
    assert!(usb_b.context_released());
}

// ============================================================================
// Motion & light
// ============================================================================

#[test]
fn test_move_grip_close_and_wrist_up() {
    let (usb, mut arm) = open_arm();
    arm.move_arm(MotionFlags::GRIP_CLOSE | MotionFlags::WRIST_UP).unwrap();
    assert_eq!(usb.last_payload(), Some(vec![0x05, 0x00, 0x01]));
}

#[test]
fn test_move_raw_0x0104() {
    let (usb, mut arm) = open_arm();
    arm.set_light(Light::Off).unwrap();
    arm.move_arm(MotionFlags::from_bits(0x0104)).unwrap();
    assert_eq!(usb.last_payload(), Some(vec![0x04, 0x01, 0x00]));
}

#[test]
fn test_move_base_ccw() {
    let (usb, mut arm) = open_arm();
    arm.move_arm(MotionFlags::BASE_CCW).unwrap();
    assert_eq!(usb.last_payload(), Some(vec![0x00, 0x02, 0x01]));
}

#[test]
fn test_conflicting_flags_are_sent_unchanged() {
    let (usb, mut arm) = open_arm();
    arm.move_arm(MotionFlags::GRIP_OPEN | MotionFlags::GRIP_CLOSE).unwrap();
    assert_eq!(usb.last_payload(), Some(vec![0x03, 0x00, 0x01]));
}

#[test]
fn test_stop_equals_move_zero() {
    let (usb, mut arm) = open_arm();
    arm.set_light(Light::Off).unwrap();
    arm.move_arm(MotionFlags::ELBOW_DOWN).unwrap();

    arm.stop().unwrap();
    let after_stop = usb.last_payload();

    arm.move_arm(MotionFlags::ELBOW_DOWN).unwrap();
    arm.move_arm(MotionFlags::STOP).unwrap();
    assert_eq!(usb.last_payload(), after_stop);
    assert_eq!(after_stop, Some(vec![0x00, 0x00, 0x00]));
}

#[test]
fn test_light_toggle_keeps_motion() {
    let (usb, mut arm) = open_arm();
    arm.move_arm(MotionFlags::SHOULDER_FWD | MotionFlags::ELBOW_UP).unwrap();

    arm.set_light(Light::On).unwrap();
    arm.set_light(Light::Off).unwrap();

    assert_eq!(arm.state().motions(), MotionFlags::SHOULDER_FWD | MotionFlags::ELBOW_UP);
    assert_eq!(usb.last_payload(), Some(vec![0x90, 0x00, 0x00]));
}

#[test]
fn test_light_persists_across_moves() {
    let (usb, mut arm) = open_arm();
    arm.set_light(Light::Off).unwrap();
    arm.move_arm(MotionFlags::BASE_CW).unwrap();
    arm.stop().unwrap();
    assert_eq!(usb.last_payload(), Some(vec![0x00, 0x00, 0x00]));
    assert_eq!(arm.state().light(), Light::Off);
}

// ============================================================================
// Failure semantics
// ============================================================================

#[test]
fn test_failed_move_triggers_safety_stop() {
    let (usb, mut arm) = open_arm();
    usb.clear_events();
    usb.fail_next_transfer(pipe_error());

    let err = arm.move_arm(MotionFlags::BASE_CW).unwrap_err();

    assert_eq!(err, ArmError::Transfer(pipe_error()));
    // 原命令不重试：一次失败的运动 + 一次停止
    assert_eq!(
        usb.payloads(),
        vec![vec![0x00, 0x01, 0x01], vec![0x00, 0x00, 0x01]]
    );
    assert!(!arm.state().is_moving());
}

#[test]
fn test_failed_move_and_failed_stop() {
    let (usb, mut arm) = open_arm();
    usb.clear_events();
    usb.set_transfer_error(Some(pipe_error()));

    let err = arm.move_arm(MotionFlags::WRIST_UP).unwrap_err();

    assert_eq!(
        err,
        ArmError::SafetyStopFailed {
            command: pipe_error(),
            stop: pipe_error(),
        }
    );
    assert!(err.is_unsafe());
    // 停止失败后不再重试
    assert_eq!(usb.transfer_count(), 2);
}

#[test]
fn test_failed_stop_reports_error() {
    let (usb, mut arm) = open_arm();
    arm.move_arm(MotionFlags::ELBOW_UP).unwrap();
    usb.fail_next_transfer(UsbError::Usb(rusb::Error::NoDevice));

    let err = arm.stop().unwrap_err();
    assert_eq!(err, ArmError::Transfer(UsbError::Usb(rusb::Error::NoDevice)));
    // 命令状态仍然是「已停止」
    assert!(!arm.state().is_moving());
}

#[test]
fn test_failed_light_keeps_session_usable() {
    let (usb, mut arm) = open_arm();
    usb.fail_next_transfer(pipe_error());

    assert!(arm.set_light(Light::Off).is_err());
    assert_eq!(arm.state().light(), Light::Off);

    arm.move_arm(MotionFlags::GRIP_OPEN).unwrap();
    assert_eq!(usb.last_payload(), Some(vec![0x02, 0x00, 0x00]));
}

#[test]
fn test_error_policy_at_the_boundary() {
    let (usb, mut arm) = open_arm();
    usb.fail_next_transfer(pipe_error());
    assert!(ErrorPolicy::Continue.apply(arm.set_light(Light::Off)).is_ok());

    usb.fail_next_transfer(pipe_error());
    assert!(ErrorPolicy::Abort.apply(arm.set_light(Light::Off)).is_err());
}

// ============================================================================
// Timed motion
// ============================================================================

#[test]
fn test_move_timed_sequence() {
    let (usb, mut arm) = open_arm();
    usb.clear_events();

    let start = Instant::now();
    arm.move_timed(MotionFlags::GRIP_OPEN, Duration::from_millis(30)).unwrap();
    assert!(start.elapsed() >= Duration::from_millis(30));

    assert_eq!(
        usb.payloads(),
        vec![vec![0x02, 0x00, 0x01], vec![0x00, 0x00, 0x01]]
    );
    assert!(!arm.state().is_moving());
}

#[test]
fn test_move_timed_stops_even_if_move_failed() {
    let (usb, mut arm) = open_arm();
    usb.clear_events();
    usb.fail_next_transfer(pipe_error());

    let err = arm
        .move_timed(MotionFlags::BASE_CCW, Duration::from_millis(1))
        .unwrap_err();

    assert_eq!(err, ArmError::Transfer(pipe_error()));
    // 失败的运动、安全停止、定时结束后的停止
    assert_eq!(
        usb.payloads(),
        vec![
            vec![0x00, 0x02, 0x01],
            vec![0x00, 0x00, 0x01],
            vec![0x00, 0x00, 0x01],
        ]
    );
    assert_eq!(arm.state().motions(), MotionFlags::STOP);
}

#[test]
fn test_move_timed_reports_final_stop_failure() {
    let (usb, mut arm) = open_arm();
    usb.clear_events();
    // 运动成功，定时结束后的停止失败
    usb.fail_nth_transfer(2, pipe_error());

    let err = arm
        .move_timed(MotionFlags::WRIST_UP, Duration::from_millis(1))
        .unwrap_err();

    assert_eq!(err, ArmError::Transfer(pipe_error()));
    assert_eq!(usb.transfer_count(), 2);
    assert!(!arm.state().is_moving());
}

#[test]
fn test_move_timed_move_error_takes_precedence() {
    let (usb, mut arm) = open_arm();
    usb.clear_events();
    usb.fail_next_transfer(UsbError::Usb(rusb::Error::Timeout));
    usb.fail_nth_transfer(3, pipe_error());

    let err = arm
        .move_timed(MotionFlags::ELBOW_UP, Duration::from_millis(1))
        .unwrap_err();

    assert_eq!(err, ArmError::Transfer(UsbError::Usb(rusb::Error::Timeout)));
    assert_eq!(usb.transfer_count(), 3);
}

// ============================================================================
// Teardown
// ============================================================================

#[test]
fn test_close_stops_turns_light_off_then_releases() {
    let (usb, mut arm) = open_arm();
    arm.move_arm(MotionFlags::SHOULDER_BACK).unwrap();
    usb.clear_events();

    arm.close();

    let events = usb.events();
    let transfers: Vec<Vec<u8>> = usb.payloads();
    assert_eq!(transfers, vec![vec![0x00, 0x00, 0x01], vec![0x00, 0x00, 0x00]]);

    let last_transfer = events
        .iter()
        .rposition(|e| matches!(e, MockEvent::Transfer { .. }))
        .unwrap();
    let closed = events
        .iter()
        .position(|e| *e == MockEvent::Closed { device: 0 })
        .unwrap();
    let released = events
        .iter()
        .position(|e| *e == MockEvent::ContextReleased)
        .unwrap();
    assert!(last_transfer < closed);
    assert!(closed < released);
}

#[test]
fn test_close_completes_despite_transfer_errors() {
    let (usb, arm) = open_arm();
    usb.clear_events();
    usb.set_transfer_error(Some(UsbError::Usb(rusb::Error::NoDevice)));

    arm.close();

    // stop 与关灯都被尝试，资源仍被释放
    assert_eq!(usb.transfer_count(), 2);
    assert!(usb.events().contains(&MockEvent::Closed { device: 0 }));
    assert!(usb.context_released());
}
