// ============================================================================
// src/ps2/constants.rs - PS/2 Link Constants
// ============================================================================

/// スキャンコードセット2のプレフィックス
pub mod prefix {
    pub const EXTENDED: u8 = 0xE0; // 拡張キー
    pub const BREAK: u8 = 0xF0;    // キー解放
}

/// 11ビットフレーム内のビット位置
pub mod frame_bits {
    pub const START: u8 = 0;       // スタートビット（常に0）
    pub const DATA_FIRST: u8 = 1;  // データビット0（LSB）
    pub const DATA_LAST: u8 = 8;   // データビット7（MSB）
    pub const PARITY: u8 = 9;      // 奇数パリティ
    pub const STOP: u8 = 10;       // ストップビット（常に1）
    pub const FRAME_LEN: u8 = 11;
}
