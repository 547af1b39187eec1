// ============================================================================
// tests/bridge.rs - クロック/データ波形からHIDレポートまでの統合テスト
// ============================================================================

use ps2_hid_bridge::hid::keycodes::keycodes::*;
use ps2_hid_bridge::ps2::{encode_frame, frame_bits};
use ps2_hid_bridge::{
    BridgeConfig, KeyboardState, Modifiers, Ps2HidBridge, ReportScheduler, Scancode,
    SharedBridge,
};

// ============================================================================
// 波形生成
// ============================================================================

/// ポーリングループ相当: 各クロック位相を `oversample` 回サンプリングする
fn drive_bits(bridge: &mut Ps2HidBridge, bits: &[bool], oversample: usize) -> Vec<Scancode> {
    let mut out = Vec::new();
    for &bit in bits {
        for _ in 0..oversample {
            out.extend(bridge.poll_link(true, bit));
        }
        for _ in 0..oversample {
            out.extend(bridge.poll_link(false, bit));
        }
    }
    // アイドル（クロックHigh）に戻す
    bridge.poll_link(true, true);
    out
}

fn drive_bytes(bridge: &mut Ps2HidBridge, bytes: &[u8]) -> Vec<Scancode> {
    bytes
        .iter()
        .flat_map(|&b| drive_bits(bridge, &encode_frame(b), 3))
        .collect()
}

// ============================================================================
// テストケース
// ============================================================================

#[test]
fn test_a_make_then_break_waveform() {
    let mut bridge = Ps2HidBridge::default();

    let out = drive_bytes(&mut bridge, &[0x1C]);
    assert_eq!(
        out,
        [Scancode { code: 0x1C, is_break: false, is_extended: false }]
    );
    assert!(bridge.keyboard().is_pressed(KEY_A));
    assert!(bridge.has_changed());

    bridge.clear_changed();
    drive_bytes(&mut bridge, &[0xF0, 0x1C]);
    assert!(!bridge.keyboard().is_pressed(KEY_A));
    assert!(bridge.has_changed());
    assert_eq!(bridge.get_keys(), [0; 6]);
}

#[test]
fn test_shift_released_while_a_held() {
    let mut bridge = Ps2HidBridge::default();
    drive_bytes(&mut bridge, &[0x12, 0x1C, 0xF0, 0x12]);

    assert_eq!(bridge.get_modifiers() & Modifiers::LEFT_SHIFT.bits(), 0);
    assert!(bridge.keyboard().is_pressed(KEY_A));
}

#[test]
fn test_extended_break_equivalent_to_direct_dispatch() {
    let mut bridge = Ps2HidBridge::default();
    drive_bytes(&mut bridge, &[0xE0, 0x75, 0x1C, 0xE0, 0xF0, 0x75]);

    let mut direct = KeyboardState::new();
    direct.dispatch(0x75, false, true);
    direct.dispatch(0x1C, false, false);
    direct.dispatch(0x75, true, true);

    assert_eq!(bridge.get_keys(), direct.get_keys());
    assert_eq!(bridge.get_modifiers(), direct.get_modifiers());
    assert!(!bridge.keyboard().is_pressed(KEY_UP_ARROW));
}

#[test]
fn test_corrupted_parity_frame_still_dispatched() {
    let mut bridge = Ps2HidBridge::default();
    let mut bits = encode_frame(0x5A);
    bits[frame_bits::PARITY as usize] ^= true;

    let out = drive_bits(&mut bridge, &bits, 1);
    assert_eq!(out[0].code, 0x5A);
    assert!(bridge.keyboard().is_pressed(KEY_ENTER));
    assert_eq!(bridge.decoder().stats().parity_errors, 1);
}

#[test]
fn test_right_ctrl_and_navigation_report() {
    let mut bridge = Ps2HidBridge::default();
    let mut scheduler = ReportScheduler::from_config(&BridgeConfig::DEFAULT).unwrap();

    drive_bytes(&mut bridge, &[0xE0, 0x14, 0xE0, 0x71]);
    let report = scheduler.poll(10, false, &mut bridge).unwrap();
    assert_eq!(report.to_bytes(), [0x10, 0, KEY_DELETE, 0, 0, 0, 0, 0]);

    let mut buf = [0u8; 8];
    assert_eq!(bridge.snapshot().write_to(&mut buf), Ok(8));
    assert_eq!(buf, report.to_bytes());
}

#[test]
fn test_seven_keys_waveform_caps_at_six() {
    let mut bridge = Ps2HidBridge::default();
    drive_bytes(&mut bridge, &[0x15, 0x1D, 0x24, 0x2D, 0x2C, 0x35, 0x3C]);

    assert_eq!(
        bridge.get_keys(),
        [KEY_Q, KEY_W, KEY_E, KEY_R, KEY_T, KEY_Y]
    );
    assert!(!bridge.keyboard().is_pressed(KEY_U));
}

#[test]
fn test_shared_bridge_sampled_like_isr() {
    static BRIDGE: SharedBridge = SharedBridge::new(BridgeConfig::DEFAULT, true);

    for &bit in encode_frame(0x29).iter() {
        BRIDGE.try_poll_link(true, bit);
        BRIDGE.try_poll_link(false, bit);
    }

    let report = BRIDGE.take_report().unwrap();
    assert!(report.is_key_pressed(KEY_SPACE));
    assert_eq!(BRIDGE.take_report(), None);

    let frames = BRIDGE.with(|bridge| bridge.decoder().stats().frames);
    assert_eq!(frames, 1);
    assert_eq!(BRIDGE.dropped_samples(), 0);
}

#[test]
fn test_isr_interrupting_report_read_does_not_block() {
    static BRIDGE: SharedBridge = SharedBridge::new(BridgeConfig::DEFAULT, true);
    let bits = encode_frame(0x5A);

    // 立ち下がりがメインループのロック区間内に来る
    for (i, &bit) in bits.iter().enumerate() {
        BRIDGE.try_poll_link(true, bit);
        if i % 3 == 0 {
            BRIDGE.with(|_| BRIDGE.try_poll_link(false, bit));
        } else {
            BRIDGE.try_poll_link(false, bit);
        }
    }
    // アイドル復帰のエッジで保留分が流れる
    BRIDGE.try_poll_link(true, true);

    assert_eq!(BRIDGE.deferred_len(), 0);
    let report = BRIDGE.take_report().unwrap();
    assert!(report.is_key_pressed(KEY_ENTER));
}
