// ============================================================================
// src/hid/keyboard.rs - Keyboard State Tracker
// ============================================================================
//!
//! スキャンコードから「現在押されているキー」の集合を維持する。
//!
//! - 修飾キーはモディファイアバイトのビットとして保持
//! - 通常キーは6スロットに先着順で格納（7キー目以降は破棄）
//! - 押下・解放ともに冪等
//! - 変更フラグは読み手（レポート送信側）だけがクリアする

use super::keymap::{translate, KeyId};
use super::report::{BootKeyboardReport, Modifiers, MAX_KEYS};
use crate::config::RolloverPolicy;

/// キーボード状態
#[derive(Debug, Clone)]
pub struct KeyboardState {
    /// 修飾キー状態
    modifiers: Modifiers,
    /// 押下中の通常キー（0 = 空き）
    keys: [u8; MAX_KEYS],
    /// 前回の読み出し以降に変化があったか
    changed: bool,
    /// ロールオーバー時の挙動
    rollover: RolloverPolicy,
    /// 7キー目以降を破棄している最中か（`ReportError` 時のみ立つ）
    overflow: bool,
}

impl KeyboardState {
    /// 新しいキーボード状態を作成
    pub const fn new() -> Self {
        Self::with_rollover(RolloverPolicy::Drop)
    }

    /// ロールオーバー挙動を指定して作成
    pub const fn with_rollover(rollover: RolloverPolicy) -> Self {
        Self {
            modifiers: Modifiers::empty(),
            keys: [0; MAX_KEYS],
            changed: false,
            rollover,
            overflow: false,
        }
    }

    /// 全キー解放状態に戻す（ロールオーバー設定は維持）
    pub fn reset(&mut self) {
        *self = Self::with_rollover(self.rollover);
    }

    /// スキャンコードを処理
    pub fn dispatch(&mut self, code: u8, is_break: bool, is_extended: bool) {
        let Some(key) = translate(code, is_extended) else {
            log::debug!(
                "kbd: unknown scancode {}{:#04x}",
                if is_extended { "E0 " } else { "" },
                code
            );
            return;
        };

        if is_break {
            self.release(key);
        } else {
            self.press(key);
        }
    }

    /// キー押下
    pub fn press(&mut self, key: KeyId) {
        match key {
            KeyId::Modifier(mask) => {
                if !self.modifiers.contains(mask) {
                    self.modifiers.insert(mask);
                    self.changed = true;
                }
            }
            KeyId::CapsLock | KeyId::Ordinary(_) => {
                if let Some(code) = key.keycode() {
                    self.press_keycode(code);
                }
            }
        }
    }

    /// キー解放
    pub fn release(&mut self, key: KeyId) {
        match key {
            KeyId::Modifier(mask) => {
                if self.modifiers.contains(mask) {
                    self.modifiers.remove(mask);
                    self.changed = true;
                }
            }
            KeyId::CapsLock | KeyId::Ordinary(_) => {
                if let Some(code) = key.keycode() {
                    self.release_keycode(code);
                }
            }
        }
    }

    fn press_keycode(&mut self, code: u8) {
        if self.keys.contains(&code) {
            return;
        }

        match self.keys.iter_mut().find(|slot| **slot == 0) {
            Some(slot) => {
                *slot = code;
                self.changed = true;
            }
            None => {
                log::debug!("kbd: rollover, dropped {:#04x}", code);
                if self.rollover == RolloverPolicy::ReportError && !self.overflow {
                    self.overflow = true;
                    self.changed = true;
                }
            }
        }
    }

    fn release_keycode(&mut self, code: u8) {
        match self.keys.iter_mut().find(|slot| **slot == code) {
            Some(slot) => {
                *slot = 0;
                self.changed = true;
            }
            None => log::debug!("kbd: release of untracked {:#04x}", code),
        }

        if self.overflow {
            self.overflow = false;
            self.changed = true;
        }
    }

    /// 修飾キー状態
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// 修飾キーバイト（入力レポート byte0）
    pub fn get_modifiers(&self) -> u8 {
        self.modifiers.bits()
    }

    /// 押下中の通常キー（スロット順）
    pub fn get_keys(&self) -> [u8; MAX_KEYS] {
        self.keys
    }

    /// 指定キーコードが押下中か
    pub fn is_pressed(&self, keycode: u8) -> bool {
        keycode != 0 && self.keys.contains(&keycode)
    }

    /// 使用中のスロット数
    pub fn pressed_count(&self) -> usize {
        self.keys.iter().filter(|&&k| k != 0).count()
    }

    /// ロールオーバーで破棄中か
    pub fn is_overflowing(&self) -> bool {
        self.overflow
    }

    /// 前回の `clear_changed` 以降に変化があったか
    pub fn has_changed(&self) -> bool {
        self.changed
    }

    /// 変更フラグをクリア（レポート送信側のみが呼ぶ）
    pub fn clear_changed(&mut self) {
        self.changed = false;
    }

    /// 現在の状態から入力レポートを作成
    pub fn snapshot(&self) -> BootKeyboardReport {
        if self.overflow {
            BootKeyboardReport::rollover_error(self.modifiers)
        } else {
            BootKeyboardReport::new(self.modifiers, self.keys)
        }
    }

    /// 変化があればレポートを返し、変更フラグをクリア
    pub fn take_report(&mut self) -> Option<BootKeyboardReport> {
        if !self.changed {
            return None;
        }
        self.changed = false;
        Some(self.snapshot())
    }
}

impl Default for KeyboardState {
    fn default() -> Self {
        Self::new()
    }
}
