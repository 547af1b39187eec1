// ============================================================================
// src/lib.rs - PS/2 to USB HID Keyboard Bridge
// ============================================================================
//!
//! # PS/2 → USB HID ブリッジコア
//!
//! PS/2キーボード（スキャンコードセット2）のシリアル信号を解読し、
//! USB HID Boot Keyboard レポート（8バイト）に変換するための状態機械群。
//!
//! ## モジュール構成
//! - `ps2` - クロック/データ線のフレームデコーダ
//! - `hid` - キーマップ、キーボード状態トラッカー、レポート型
//! - `bridge` - デコーダとトラッカーを束ねるドライバ、共有ラッパー、送信スケジューラ
//! - `config` - ブリッジ設定
//! - `error` - 外部境界のエラー型
//! - `logger` - `log`クレート用ロガー
//!
//! ## データフロー
//! ```text
//! (clock, data) → FrameDecoder → Scancode → KeyboardState → BootKeyboardReport
//! ```
//!
//! USBスタック、ボード初期化、LED点滅は範囲外。呼び出し側のポーリング
//! ループが `poll_link` とレポート送信を一定周期で呼び出す。

#![cfg_attr(not(test), no_std)]

pub mod bridge;
pub mod config;
pub mod error;
pub mod hid;
pub mod logger;
pub mod ps2;

pub use bridge::{Ps2HidBridge, ReportScheduler, ReportSource, SharedBridge};
pub use config::{BridgeConfig, RolloverPolicy};
pub use error::{BridgeError, Result};
pub use hid::{BootKeyboardReport, KeyId, KeyboardLeds, KeyboardState, Modifiers};
pub use ps2::{FrameDecoder, FrameState, FrameStats, Scancode};
