// ============================================================================
// src/hid/mod.rs - HID Keyboard Module
// ============================================================================
//!
//! # HIDキーボード
//!
//! ## モジュール構成
//! - `keycodes` - HIDキーコードとキーマップ用予約値
//! - `keymap` - セット2 → キー識別子テーブル
//! - `keyboard` - キーボード状態トラッカー
//! - `report` - Boot Protocol レポート

mod keyboard;
pub mod keycodes;
pub mod keymap;
mod report;

pub use keyboard::KeyboardState;
pub use keymap::{translate, KeyId};
pub use report::{BootKeyboardReport, KeyboardLeds, Modifiers, BOOT_REPORT_LEN, MAX_KEYS};
