// ============================================================================
// src/ps2/mod.rs - PS/2 Link Module
// ============================================================================
//!
//! PS/2リンク層
//!
//! - クロック/データ線の立ち下がりエッジ検出
//! - 11ビットフレームの復元
//! - E0/F0プレフィックスの集約
//!

mod constants;
mod frame;

pub use constants::{frame_bits, prefix};
pub use frame::{encode_frame, odd_parity, FrameDecoder, FrameState, FrameStats, Scancode};
