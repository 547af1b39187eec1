// ============================================================================
// src/ps2/frame.rs - PS/2 Frame Decoder
// ============================================================================
//!
//! PS/2デバイス→ホスト方向の11ビットフレームを復元する。
//!
//! ```text
//! clock ‾‾\__/‾‾\__/‾‾ ... ‾‾\__/‾‾‾‾
//! data    start d0 d1  ...  parity stop
//! ```
//!
//! クロックの立ち下がりでのみデータ線をサンプリングする。スタート、
//! パリティ、ストップビットは検証しない（統計のみ記録）。

use super::constants::{frame_bits, prefix};

/// 完成したスキャンコード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scancode {
    /// プレフィックスを除いたコード
    pub code: u8,
    /// F0プレフィックス付き（キー解放）
    pub is_break: bool,
    /// E0プレフィックス付き（拡張キー）
    pub is_extended: bool,
}

/// フレーム受信状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// スタートビット待ち
    WaitStart,
    /// データビット受信中（受信済みビット数 0..=7）
    ReadData(u8),
    /// パリティビット待ち
    ReadParity,
    /// ストップビット待ち
    ReadStop,
}

impl FrameState {
    /// フレーム内のビット位置 (0..=10)
    pub const fn bit_index(self) -> u8 {
        match self {
            FrameState::WaitStart => frame_bits::START,
            FrameState::ReadData(n) => frame_bits::DATA_FIRST + n,
            FrameState::ReadParity => frame_bits::PARITY,
            FrameState::ReadStop => frame_bits::STOP,
        }
    }
}

/// 受信統計（診断用、挙動には影響しない）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// 完了したフレーム数
    pub frames: u32,
    /// パリティ不一致
    pub parity_errors: u32,
    /// スタートビットが1、またはストップビットが0
    pub framing_errors: u32,
}

/// バイトの奇数パリティビットを計算
pub const fn odd_parity(byte: u8) -> bool {
    byte.count_ones() % 2 == 0
}

/// 1バイトを11ビットフレームに符号化（送信順）
///
/// テストやシミュレータで波形を組み立てるために使う。
pub fn encode_frame(byte: u8) -> [bool; frame_bits::FRAME_LEN as usize] {
    let mut bits = [false; frame_bits::FRAME_LEN as usize];
    for i in 0..8 {
        bits[(frame_bits::DATA_FIRST + i) as usize] = (byte >> i) & 1 != 0;
    }
    bits[frame_bits::PARITY as usize] = odd_parity(byte);
    bits[frame_bits::STOP as usize] = true;
    bits
}

/// PS/2フレームデコーダ
pub struct FrameDecoder {
    /// 受信状態
    state: FrameState,
    /// 受信中のデータバイト
    byte: u8,
    /// 前回のクロックレベル（立ち下がり検出用）
    previous_clock: bool,
    /// サンプリングしたスタートビット
    start_bit: bool,
    /// サンプリングしたパリティビット
    parity_bit: bool,
    /// F0受信済み
    break_pending: bool,
    /// E0受信済み
    extended_pending: bool,
    /// 受信統計
    stats: FrameStats,
}

impl FrameDecoder {
    /// 新しいデコーダを作成
    ///
    /// `initial_clock` は初期化時点のクロック線レベル。
    pub const fn new(initial_clock: bool) -> Self {
        Self {
            state: FrameState::WaitStart,
            byte: 0,
            previous_clock: initial_clock,
            start_bit: false,
            parity_bit: false,
            break_pending: false,
            extended_pending: false,
            stats: FrameStats {
                frames: 0,
                parity_errors: 0,
                framing_errors: 0,
            },
        }
    }

    /// 初期状態に戻す
    pub fn reset(&mut self, initial_clock: bool) {
        *self = Self::new(initial_clock);
    }

    /// クロック/データ線を1回サンプリング
    ///
    /// 立ち下がりエッジ以外では何もしない。プレフィックス以外のバイトで
    /// フレームが完了したときだけ `Some` を返す。
    pub fn poll_link(&mut self, clock: bool, data: bool) -> Option<Scancode> {
        let falling = self.previous_clock && !clock;
        self.previous_clock = clock;
        if !falling {
            return None;
        }

        let byte = self.clock_in(data)?;
        self.feed_byte(byte)
    }

    /// 受信済みバイトをプレフィックス処理に通す
    ///
    /// バイト単位で受け取れる経路（ハードウェアコントローラ等）からも使える。
    pub fn feed_byte(&mut self, byte: u8) -> Option<Scancode> {
        match byte {
            prefix::BREAK => {
                self.break_pending = true;
                None
            }
            prefix::EXTENDED => {
                self.extended_pending = true;
                None
            }
            code => {
                let scancode = Scancode {
                    code,
                    is_break: self.break_pending,
                    is_extended: self.extended_pending,
                };
                self.break_pending = false;
                self.extended_pending = false;
                Some(scancode)
            }
        }
    }

    /// 立ち下がりエッジ1回分の状態遷移
    fn clock_in(&mut self, data: bool) -> Option<u8> {
        let (next, completed) = match self.state {
            FrameState::WaitStart => {
                self.start_bit = data;
                (FrameState::ReadData(0), None)
            }
            FrameState::ReadData(n) => {
                if data {
                    self.byte |= 1 << n;
                }
                if frame_bits::DATA_FIRST + n == frame_bits::DATA_LAST {
                    (FrameState::ReadParity, None)
                } else {
                    (FrameState::ReadData(n + 1), None)
                }
            }
            FrameState::ReadParity => {
                self.parity_bit = data;
                (FrameState::ReadStop, None)
            }
            FrameState::ReadStop => {
                let byte = self.byte;
                self.record_frame(byte, data);
                self.byte = 0;
                (FrameState::WaitStart, Some(byte))
            }
        };
        self.state = next;
        completed
    }

    fn record_frame(&mut self, byte: u8, stop_bit: bool) {
        self.stats.frames = self.stats.frames.wrapping_add(1);
        if self.parity_bit != odd_parity(byte) {
            self.stats.parity_errors = self.stats.parity_errors.wrapping_add(1);
            log::trace!("ps2: parity mismatch on {:#04x}", byte);
        }
        if self.start_bit || !stop_bit {
            self.stats.framing_errors = self.stats.framing_errors.wrapping_add(1);
            log::trace!("ps2: framing anomaly on {:#04x}", byte);
        }
        log::trace!("ps2: frame {:#04x}", byte);
    }

    /// 現在の受信状態
    pub fn state(&self) -> FrameState {
        self.state
    }

    /// フレーム内のビット位置 (0..=10)
    pub fn bit_index(&self) -> u8 {
        self.state.bit_index()
    }

    /// F0プレフィックスが保留中か
    pub fn break_pending(&self) -> bool {
        self.break_pending
    }

    /// E0プレフィックスが保留中か
    pub fn extended_pending(&self) -> bool {
        self.extended_pending
    }

    /// 受信統計
    pub fn stats(&self) -> FrameStats {
        self.stats
    }
}

impl Default for FrameDecoder {
    /// アイドル状態（プルアップでクロックHigh）から開始
    fn default() -> Self {
        Self::new(true)
    }
}
