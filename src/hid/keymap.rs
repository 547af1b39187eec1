// ============================================================================
// src/hid/keymap.rs - PS/2 Set 2 → HID Translation Tables
// ============================================================================
//!
//! スキャンコードセット2 → キー識別子の変換テーブル。
//!
//! インデックスは生のスキャンコード、値は HID キーコードまたは
//! `sentinel` の予約値。0 は未割り当て。

use super::keycodes::{keycodes::*, sentinel};
use super::report::Modifiers;

/// 論理キー識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyId {
    /// 修飾キー（モディファイアバイトの1ビット）
    Modifier(Modifiers),
    /// Caps Lock（通常キー 0x39 として報告）
    CapsLock,
    /// 通常キー（HIDキーコード）
    Ordinary(u8),
}

impl KeyId {
    /// テーブル値から識別子を作成（0 は `None`）
    pub const fn from_raw(raw: u8) -> Option<Self> {
        let id = match raw {
            0 => return None,
            sentinel::LEFT_CTRL => KeyId::Modifier(Modifiers::LEFT_CTRL),
            sentinel::LEFT_SHIFT => KeyId::Modifier(Modifiers::LEFT_SHIFT),
            sentinel::LEFT_ALT => KeyId::Modifier(Modifiers::LEFT_ALT),
            sentinel::LEFT_GUI => KeyId::Modifier(Modifiers::LEFT_GUI),
            sentinel::RIGHT_CTRL => KeyId::Modifier(Modifiers::RIGHT_CTRL),
            sentinel::RIGHT_SHIFT => KeyId::Modifier(Modifiers::RIGHT_SHIFT),
            sentinel::RIGHT_ALT => KeyId::Modifier(Modifiers::RIGHT_ALT),
            sentinel::RIGHT_GUI => KeyId::Modifier(Modifiers::RIGHT_GUI),
            sentinel::CAPS_LOCK => KeyId::CapsLock,
            code => KeyId::Ordinary(code),
        };
        Some(id)
    }

    /// キー配列に格納するHIDキーコード（修飾キーは `None`）
    pub const fn keycode(self) -> Option<u8> {
        match self {
            KeyId::Modifier(_) => None,
            KeyId::CapsLock => Some(KEY_CAPS_LOCK),
            KeyId::Ordinary(code) => Some(code),
        }
    }
}

/// `(scancode, value)` の組からテーブルを構築
const fn build(entries: &[(u8, u8)]) -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < entries.len() {
        table[entries[i].0 as usize] = entries[i].1;
        i += 1;
    }
    table
}

/// 通常スキャンコード → キー識別子
pub static PLAIN: [u8; 256] = build(&[
    // 0x00-0x0F
    (0x01, KEY_F9),
    (0x03, KEY_F5),
    (0x04, KEY_F3),
    (0x05, KEY_F1),
    (0x06, KEY_F2),
    (0x07, KEY_F12),
    (0x09, KEY_F10),
    (0x0A, KEY_F8),
    (0x0B, KEY_F6),
    (0x0C, KEY_F4),
    (0x0D, KEY_TAB),
    (0x0E, KEY_GRAVE),
    // 0x10-0x1F
    (0x11, sentinel::LEFT_ALT),
    (0x12, sentinel::LEFT_SHIFT),
    (0x14, sentinel::LEFT_CTRL),
    (0x15, KEY_Q),
    (0x16, KEY_1),
    (0x1A, KEY_Z),
    (0x1B, KEY_S),
    (0x1C, KEY_A),
    (0x1D, KEY_W),
    (0x1E, KEY_2),
    // 0x20-0x2F
    (0x21, KEY_C),
    (0x22, KEY_X),
    (0x23, KEY_D),
    (0x24, KEY_E),
    (0x25, KEY_4),
    (0x26, KEY_3),
    (0x29, KEY_SPACE),
    (0x2A, KEY_V),
    (0x2B, KEY_F),
    (0x2C, KEY_T),
    (0x2D, KEY_R),
    (0x2E, KEY_5),
    // 0x30-0x3F
    (0x31, KEY_N),
    (0x32, KEY_B),
    (0x33, KEY_H),
    (0x34, KEY_G),
    (0x35, KEY_Y),
    (0x36, KEY_6),
    (0x3A, KEY_M),
    (0x3B, KEY_J),
    (0x3C, KEY_U),
    (0x3D, KEY_7),
    (0x3E, KEY_8),
    // 0x40-0x4F
    (0x41, KEY_COMMA),
    (0x42, KEY_K),
    (0x43, KEY_I),
    (0x44, KEY_O),
    (0x45, KEY_0),
    (0x46, KEY_9),
    (0x49, KEY_DOT),
    (0x4A, KEY_SLASH),
    (0x4B, KEY_L),
    (0x4C, KEY_SEMICOLON),
    (0x4D, KEY_P),
    (0x4E, KEY_MINUS),
    // 0x50-0x5F
    (0x52, KEY_APOSTROPHE),
    (0x54, KEY_LEFT_BRACKET),
    (0x55, KEY_EQUAL),
    (0x58, sentinel::CAPS_LOCK),
    (0x59, sentinel::RIGHT_SHIFT),
    (0x5A, KEY_ENTER),
    (0x5B, KEY_RIGHT_BRACKET),
    (0x5D, KEY_BACKSLASH),
    // 0x60-0x6F
    (0x66, KEY_BACKSPACE),
    (0x69, KEY_KP_1),
    (0x6B, KEY_KP_4),
    (0x6C, KEY_KP_7),
    // 0x70-0x7F
    (0x70, KEY_KP_0),
    (0x71, KEY_KP_DOT),
    (0x72, KEY_KP_2),
    (0x73, KEY_KP_5),
    (0x74, KEY_KP_6),
    (0x75, KEY_KP_8),
    (0x76, KEY_ESC),
    (0x77, KEY_NUM_LOCK), // Num Lock は 0x77（Scroll Lock と逆にしない）
    (0x78, KEY_F11),
    (0x79, KEY_KP_PLUS),
    (0x7A, KEY_KP_3),
    (0x7B, KEY_KP_MINUS),
    (0x7C, KEY_KP_ASTERISK),
    (0x7D, KEY_KP_9),
    (0x7E, KEY_SCROLL_LOCK), // Scroll Lock は 0x7E
    // 0x80-0x8F
    (0x83, KEY_F7),
]);

/// 拡張スキャンコード（E0付き）→ キー識別子
pub static EXTENDED: [u8; 256] = build(&[
    (0x11, sentinel::RIGHT_ALT),
    (0x14, sentinel::RIGHT_CTRL),
    (0x1F, sentinel::LEFT_GUI),
    (0x27, sentinel::RIGHT_GUI),
    (0x2F, KEY_APPLICATION),
    // テンキー
    (0x4A, KEY_KP_SLASH),
    (0x5A, KEY_KP_ENTER),
    // ナビゲーション
    (0x69, KEY_END),
    (0x6B, KEY_LEFT_ARROW),
    (0x6C, KEY_HOME),
    (0x70, KEY_INSERT),
    (0x71, KEY_DELETE),
    (0x72, KEY_DOWN_ARROW),
    (0x74, KEY_RIGHT_ARROW),
    (0x75, KEY_UP_ARROW),
    (0x7A, KEY_PAGE_DOWN),
    (0x7D, KEY_PAGE_UP),
]);

/// スキャンコードをキー識別子に変換（未割り当ては `None`）
pub fn translate(code: u8, is_extended: bool) -> Option<KeyId> {
    let table = if is_extended { &EXTENDED } else { &PLAIN };
    KeyId::from_raw(table[code as usize])
}
