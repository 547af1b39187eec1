// ============================================================================
// src/hid/report.rs - Boot Protocol Keyboard Reports
// ============================================================================
//!
//! Boot Protocol キーボードの入力/出力レポート。
//!
//! ## 入力レポート（8バイト）
//! ```text
//! [0] modifiers  [1] reserved  [2..8] keycodes
//! ```
//!
//! ## 出力レポート（1バイト）
//! ホストから送られるLED状態。ブリッジのキーボード状態には反映しない。

use bitflags::bitflags;

use super::keycodes::keycodes::KEY_ERROR_ROLL_OVER;
use crate::error::{BridgeError, Result};

/// 同時押し可能な通常キー数
pub const MAX_KEYS: usize = 6;

/// 入力レポート長
pub const BOOT_REPORT_LEN: usize = 8;

bitflags! {
    /// 修飾キー（入力レポート byte0）
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Modifiers: u8 {
        const LEFT_CTRL = 1 << 0;
        const LEFT_SHIFT = 1 << 1;
        const LEFT_ALT = 1 << 2;
        const LEFT_GUI = 1 << 3;
        const RIGHT_CTRL = 1 << 4;
        const RIGHT_SHIFT = 1 << 5;
        const RIGHT_ALT = 1 << 6;
        const RIGHT_GUI = 1 << 7;
    }
}

bitflags! {
    /// キーボードLED（出力レポート byte0）
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct KeyboardLeds: u8 {
        const NUM_LOCK = 1 << 0;
        // HID Boot 配置: Caps Lock は bit1（bit0 は Num Lock）
        const CAPS_LOCK = 1 << 1;
        const SCROLL_LOCK = 1 << 2;
        const COMPOSE = 1 << 3;
        const KANA = 1 << 4;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::empty()
    }
}

impl Default for KeyboardLeds {
    fn default() -> Self {
        Self::empty()
    }
}

impl KeyboardLeds {
    /// SET_REPORT (Output) のペイロードから解析
    ///
    /// レポートIDなしの Boot Protocol では先頭バイトがLED状態。
    /// 空のバッファは `None`。
    pub fn from_output_report(data: &[u8]) -> Option<Self> {
        data.first().map(|&b| Self::from_bits_truncate(b))
    }
}

/// Boot Protocol キーボードレポート
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BootKeyboardReport {
    /// 修飾キー
    pub modifiers: Modifiers,
    /// 予約（常に0）
    pub reserved: u8,
    /// キーコード (最大6キー同時押し)
    pub keycodes: [u8; MAX_KEYS],
}

impl BootKeyboardReport {
    /// 新しいレポートを作成
    pub const fn new(modifiers: Modifiers, keycodes: [u8; MAX_KEYS]) -> Self {
        Self {
            modifiers,
            reserved: 0,
            keycodes,
        }
    }

    /// ロールオーバーエラーレポート（全スロット 0x01）
    pub const fn rollover_error(modifiers: Modifiers) -> Self {
        Self::new(modifiers, [KEY_ERROR_ROLL_OVER; MAX_KEYS])
    }

    /// 修飾キーが押されているか
    pub fn is_modifier_pressed(&self, modifier: Modifiers) -> bool {
        self.modifiers.contains(modifier)
    }

    /// 指定されたキーが押されているか
    pub fn is_key_pressed(&self, keycode: u8) -> bool {
        keycode != 0 && self.keycodes.contains(&keycode)
    }

    /// ロールオーバーエラーを示しているか
    pub fn is_rollover_error(&self) -> bool {
        self.keycodes.iter().all(|&k| k == KEY_ERROR_ROLL_OVER)
    }

    /// 8バイトのワイヤ形式に変換
    pub fn to_bytes(&self) -> [u8; BOOT_REPORT_LEN] {
        let k = &self.keycodes;
        [self.modifiers.bits(), self.reserved, k[0], k[1], k[2], k[3], k[4], k[5]]
    }

    /// GET_REPORT 応答用にバッファへ書き出す
    ///
    /// 書き込んだバイト数を返す。8バイト未満のバッファはエラー
    /// （USBスタック側はSTALLで応答する）。
    pub fn write_to(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < BOOT_REPORT_LEN {
            return Err(BridgeError::BufferTooSmall {
                needed: BOOT_REPORT_LEN,
                got: buf.len(),
            });
        }
        buf[..BOOT_REPORT_LEN].copy_from_slice(&self.to_bytes());
        Ok(BOOT_REPORT_LEN)
    }
}
