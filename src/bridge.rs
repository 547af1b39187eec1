// ============================================================================
// src/bridge.rs - PS/2 → HID Bridge Driver
// ============================================================================
//!
//! # ブリッジドライバ
//!
//! フレームデコーダとキーボード状態を1つのオブジェクトにまとめる。
//!
//! ## 使い方（ポーリング）
//! ```rust,ignore
//! let mut bridge = Ps2HidBridge::new(BridgeConfig::DEFAULT, clk.is_high());
//! let mut scheduler = ReportScheduler::from_config(&BridgeConfig::DEFAULT)?;
//! loop {
//!     usb.task();
//!     bridge.poll_link(clk.is_high(), dat.is_high());
//!     if let Some(report) = scheduler.poll(millis(), usb.suspended(), &mut bridge) {
//!         usb.send_keyboard_report(&report.to_bytes());
//!     }
//! }
//! ```
//!
//! ## 割り込みからサンプリングする場合
//! `SharedBridge` を `static` に置き、ISR は `try_poll_link`、メインループは
//! `take_report` を呼ぶ。どちらも1回のロック区間で完結する。
//! ISR 側はロックを待たないので、メインループがロック中に割り込まれても
//! デッドロックしない。

use core::sync::atomic::{AtomicU8, AtomicU32, Ordering};

use spin::Mutex;

use crate::config::BridgeConfig;
use crate::error::Result;
use crate::hid::{BootKeyboardReport, KeyboardState, MAX_KEYS};
use crate::ps2::{FrameDecoder, Scancode};

// ============================================================================
// Report Source
// ============================================================================

/// レポート送信側から見たキーボード状態
///
/// 「変更確認 → 読み出し → 変更フラグのクリア」を1手順で行う。
pub trait ReportSource {
    /// 変化があればレポートを返し、変更フラグをクリア
    fn take_report(&mut self) -> Option<BootKeyboardReport>;
}

impl ReportSource for KeyboardState {
    fn take_report(&mut self) -> Option<BootKeyboardReport> {
        KeyboardState::take_report(self)
    }
}

// ============================================================================
// Bridge
// ============================================================================

/// PS/2 → HID ブリッジ
pub struct Ps2HidBridge {
    /// フレームデコーダ
    decoder: FrameDecoder,
    /// キーボード状態
    keyboard: KeyboardState,
}

impl Ps2HidBridge {
    /// 新しいブリッジを作成
    ///
    /// `initial_clock` は初期化時点のクロック線レベル。
    pub const fn new(config: BridgeConfig, initial_clock: bool) -> Self {
        Self {
            decoder: FrameDecoder::new(initial_clock),
            keyboard: KeyboardState::with_rollover(config.rollover),
        }
    }

    /// リンクとキーボード状態を初期化
    pub fn reset(&mut self, initial_clock: bool) {
        self.decoder.reset(initial_clock);
        self.keyboard.reset();
    }

    /// クロック/データ線を1回サンプリングし、完成したスキャンコードを反映
    ///
    /// 反映したスキャンコードを返す（観測用）。
    pub fn poll_link(&mut self, clock: bool, data: bool) -> Option<Scancode> {
        let scancode = self.decoder.poll_link(clock, data)?;
        self.dispatch(scancode);
        Some(scancode)
    }

    /// バイト単位で受信したコードを反映
    pub fn feed_byte(&mut self, byte: u8) -> Option<Scancode> {
        let scancode = self.decoder.feed_byte(byte)?;
        self.dispatch(scancode);
        Some(scancode)
    }

    /// スキャンコードをキーボード状態へ反映
    pub fn dispatch(&mut self, scancode: Scancode) {
        self.keyboard
            .dispatch(scancode.code, scancode.is_break, scancode.is_extended);
    }

    /// 修飾キーバイト
    pub fn get_modifiers(&self) -> u8 {
        self.keyboard.get_modifiers()
    }

    /// 押下中の通常キー
    pub fn get_keys(&self) -> [u8; MAX_KEYS] {
        self.keyboard.get_keys()
    }

    /// 変更フラグ
    pub fn has_changed(&self) -> bool {
        self.keyboard.has_changed()
    }

    /// 変更フラグをクリア
    pub fn clear_changed(&mut self) {
        self.keyboard.clear_changed();
    }

    /// 現在の入力レポート（GET_REPORT 応答用、フラグは変えない）
    pub fn snapshot(&self) -> BootKeyboardReport {
        self.keyboard.snapshot()
    }

    /// 変化があればレポートを返し、変更フラグをクリア
    pub fn take_report(&mut self) -> Option<BootKeyboardReport> {
        self.keyboard.take_report()
    }

    /// キーボード状態
    pub fn keyboard(&self) -> &KeyboardState {
        &self.keyboard
    }

    /// フレームデコーダ
    pub fn decoder(&self) -> &FrameDecoder {
        &self.decoder
    }
}

impl Default for Ps2HidBridge {
    fn default() -> Self {
        Self::new(BridgeConfig::DEFAULT, true)
    }
}

impl ReportSource for Ps2HidBridge {
    fn take_report(&mut self) -> Option<BootKeyboardReport> {
        Ps2HidBridge::take_report(self)
    }
}

// ============================================================================
// Shared Bridge (ISR + main loop)
// ============================================================================

/// ロック中に保留できるサンプル数
pub const DEFERRED_SAMPLES: usize = 4;

/// 割り込みコンテキストと共有するブリッジ
///
/// 書き手は `try_poll_link` / `feed_byte`（1つのコンテキストのみ）、
/// 読み手は `take_report` / `snapshot`（1つのコンテキストのみ）。
///
/// `try_poll_link` はロックが取れないとき、その回のサンプルを保留して即座に戻る。
/// 保留分は次にロックを取れた `try_poll_link` で、到着順に再生される。
/// 保留はISRコンテキストだけが読み書きする。
pub struct SharedBridge {
    inner: Mutex<Ps2HidBridge>,
    /// 保留サンプル（bit1 = clock, bit0 = data）
    deferred: [AtomicU8; DEFERRED_SAMPLES],
    deferred_len: AtomicU8,
    /// 保留しきれず捨てたサンプル数
    dropped: AtomicU32,
}

impl SharedBridge {
    /// 新しい共有ブリッジを作成（`static` 初期化可能）
    pub const fn new(config: BridgeConfig, initial_clock: bool) -> Self {
        Self {
            inner: Mutex::new(Ps2HidBridge::new(config, initial_clock)),
            deferred: [const { AtomicU8::new(0) }; DEFERRED_SAMPLES],
            deferred_len: AtomicU8::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// クロック/データ線を1回サンプリング（ロックを待つ）
    ///
    /// マルチコア、またはリンク割り込みを使わない構成向け。
    /// シングルコアのISRからは `try_poll_link` を使う。
    pub fn poll_link(&self, clock: bool, data: bool) -> Option<Scancode> {
        self.inner.lock().poll_link(clock, data)
    }

    /// クロック/データ線を1回サンプリング（ロックを待たない）
    ///
    /// ロック中ならサンプルを保留して `None` を返す。
    pub fn try_poll_link(&self, clock: bool, data: bool) -> Option<Scancode> {
        let Some(mut bridge) = self.inner.try_lock() else {
            self.defer(clock, data);
            return None;
        };
        self.replay_deferred(&mut bridge)
            .or(bridge.poll_link(clock, data))
    }

    /// 保留中のサンプル数
    pub fn deferred_len(&self) -> usize {
        self.deferred_len.load(Ordering::Acquire) as usize
    }

    /// 保留しきれずに捨てたサンプル数
    pub fn dropped_samples(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn defer(&self, clock: bool, data: bool) {
        let len = self.deferred_len.load(Ordering::Acquire) as usize;
        if len >= DEFERRED_SAMPLES {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }
        let sample = ((clock as u8) << 1) | data as u8;
        self.deferred[len].store(sample, Ordering::Relaxed);
        self.deferred_len.store(len as u8 + 1, Ordering::Release);
    }

    /// 保留サンプルを到着順に流す（ロック保持中に呼ぶ）
    fn replay_deferred(&self, bridge: &mut Ps2HidBridge) -> Option<Scancode> {
        let len = self.deferred_len.swap(0, Ordering::Acquire) as usize;
        let mut out = None;
        for slot in &self.deferred[..len] {
            let sample = slot.load(Ordering::Relaxed);
            let scancode = bridge.poll_link(sample & 0b10 != 0, sample & 0b01 != 0);
            out = out.or(scancode);
        }
        out
    }

    /// バイト単位で受信したコードを反映
    pub fn feed_byte(&self, byte: u8) -> Option<Scancode> {
        self.inner.lock().feed_byte(byte)
    }

    /// 変化があればレポートを返し、変更フラグをクリア（1ロック区間）
    pub fn take_report(&self) -> Option<BootKeyboardReport> {
        self.inner.lock().take_report()
    }

    /// 現在の入力レポート（フラグは変えない）
    pub fn snapshot(&self) -> BootKeyboardReport {
        self.inner.lock().snapshot()
    }

    /// 変更フラグ
    pub fn has_changed(&self) -> bool {
        self.inner.lock().has_changed()
    }

    /// リンクとキーボード状態を初期化
    pub fn reset(&self, initial_clock: bool) {
        self.inner.lock().reset(initial_clock);
    }

    /// ロックを取った状態でブリッジを操作
    pub fn with<R>(&self, f: impl FnOnce(&mut Ps2HidBridge) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut *guard)
    }
}

impl ReportSource for &SharedBridge {
    fn take_report(&mut self) -> Option<BootKeyboardReport> {
        SharedBridge::take_report(*self)
    }
}

// ============================================================================
// Report Scheduler
// ============================================================================

/// 入力レポートの送信周期を管理する
///
/// 周期ごとに1回だけ状態を確認し、変化があったときだけレポートを出す。
/// 時刻は `u32` ミリ秒（ラップアラウンド対応）。
#[derive(Debug, Clone, Copy)]
pub struct ReportScheduler {
    /// 送信周期 (ms)
    interval_ms: u32,
    /// 直近の周期の開始時刻 (ms)
    start_ms: u32,
}

impl ReportScheduler {
    /// 新しいスケジューラを作成（時刻0起点）
    pub fn new(interval_ms: u32) -> Result<Self> {
        BridgeConfig::DEFAULT
            .with_report_interval(interval_ms)
            .validate()?;
        Ok(Self {
            interval_ms,
            start_ms: 0,
        })
    }

    /// 設定から作成
    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        Self::new(config.report_interval_ms)
    }

    /// 起点時刻を設定
    pub fn restart(&mut self, now_ms: u32) {
        self.start_ms = now_ms;
    }

    /// 送信周期
    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    /// 周期が経過したか
    ///
    /// 経過していれば起点を1周期分だけ進める（遅れた分は次回以降に追いつく）。
    pub fn due(&mut self, now_ms: u32) -> bool {
        if now_ms.wrapping_sub(self.start_ms) < self.interval_ms {
            return false;
        }
        self.start_ms = self.start_ms.wrapping_add(self.interval_ms);
        true
    }

    /// 周期処理
    ///
    /// サスペンド中はレポートを出さず、変更フラグも保持する。
    pub fn poll<S: ReportSource>(
        &mut self,
        now_ms: u32,
        suspended: bool,
        source: &mut S,
    ) -> Option<BootKeyboardReport> {
        if !self.due(now_ms) || suspended {
            return None;
        }
        source.take_report()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RolloverPolicy;
    use crate::error::BridgeError;

    #[test]
    fn test_feed_bytes_shift_a() {
        let mut bridge = Ps2HidBridge::default();
        for b in [0x12, 0x1C, 0xF0, 0x12] {
            bridge.feed_byte(b);
        }
        assert_eq!(bridge.get_modifiers(), 0);
        assert_eq!(bridge.get_keys(), [0x04, 0, 0, 0, 0, 0]);
        assert!(bridge.has_changed());
    }

    #[test]
    fn test_feed_byte_returns_dispatched_scancode() {
        let mut bridge = Ps2HidBridge::default();
        assert_eq!(bridge.feed_byte(0xE0), None);
        assert_eq!(
            bridge.feed_byte(0x75),
            Some(Scancode { code: 0x75, is_break: false, is_extended: true })
        );
        assert!(bridge.keyboard().is_pressed(0x52));
    }

    #[test]
    fn test_scheduler_interval() {
        let mut scheduler = ReportScheduler::new(10).unwrap();
        assert!(!scheduler.due(0));
        assert!(!scheduler.due(9));
        assert!(scheduler.due(10));
        assert!(!scheduler.due(15));
        assert!(scheduler.due(20));
    }

    #[test]
    fn test_scheduler_catches_up() {
        let mut scheduler = ReportScheduler::new(10).unwrap();
        // 35ms 遅れ: 3周期分を順に消化
        assert!(scheduler.due(35));
        assert!(scheduler.due(35));
        assert!(scheduler.due(35));
        assert!(!scheduler.due(35));
    }

    #[test]
    fn test_scheduler_wraps() {
        let mut scheduler = ReportScheduler::new(10).unwrap();
        scheduler.restart(u32::MAX - 4);
        assert!(!scheduler.due(u32::MAX));
        assert!(scheduler.due(5));
    }

    #[test]
    fn test_scheduler_rejects_zero_interval() {
        assert!(matches!(
            ReportScheduler::new(0),
            Err(BridgeError::InvalidReportInterval)
        ));
    }

    #[test]
    fn test_scheduler_poll_emits_only_on_change() {
        let mut bridge = Ps2HidBridge::default();
        let mut scheduler = ReportScheduler::new(10).unwrap();

        assert_eq!(scheduler.poll(10, false, &mut bridge), None);

        bridge.feed_byte(0x1C);
        assert_eq!(scheduler.poll(15, false, &mut bridge), None);
        let report = scheduler.poll(20, false, &mut bridge).unwrap();
        assert!(report.is_key_pressed(0x04));
        assert!(!bridge.has_changed());
        assert_eq!(scheduler.poll(30, false, &mut bridge), None);
    }

    #[test]
    fn test_scheduler_suspended_keeps_flag() {
        let mut bridge = Ps2HidBridge::default();
        let mut scheduler = ReportScheduler::new(10).unwrap();
        bridge.feed_byte(0x1C);

        assert_eq!(scheduler.poll(10, true, &mut bridge), None);
        assert!(bridge.has_changed());
        assert!(scheduler.poll(20, false, &mut bridge).is_some());
    }

    #[test]
    fn test_shared_bridge_take_report() {
        static BRIDGE: SharedBridge = SharedBridge::new(BridgeConfig::DEFAULT, true);

        BRIDGE.feed_byte(0x14);
        BRIDGE.feed_byte(0x21);
        let report = BRIDGE.take_report().unwrap();
        assert_eq!(report.to_bytes(), [0x01, 0, 0x06, 0, 0, 0, 0, 0]);
        assert!(!BRIDGE.has_changed());
        assert_eq!(BRIDGE.take_report(), None);

        let mut scheduler = ReportScheduler::new(10).unwrap();
        BRIDGE.feed_byte(0xF0);
        BRIDGE.feed_byte(0x21);
        let report = scheduler.poll(10, false, &mut &BRIDGE).unwrap();
        assert_eq!(report.keycodes, [0; 6]);

        BRIDGE.reset(true);
        assert_eq!(BRIDGE.snapshot(), BootKeyboardReport::default());
    }

    /// 1ビットを立ち下がりまでサンプリング
    fn clock_bit(shared: &SharedBridge, bit: bool) -> Option<Scancode> {
        shared
            .try_poll_link(true, bit)
            .or(shared.try_poll_link(false, bit))
    }

    #[test]
    fn test_try_poll_link_defers_while_locked() {
        let shared = SharedBridge::new(BridgeConfig::DEFAULT, true);
        let bits = crate::ps2::encode_frame(0x1C);

        for &bit in &bits[..5] {
            assert_eq!(clock_bit(&shared, bit), None);
        }

        // メインループがロック中に割り込まれた状況
        shared.with(|_| {
            assert_eq!(clock_bit(&shared, bits[5]), None);
            assert_eq!(shared.deferred_len(), 2);
        });

        let mut out = None;
        for &bit in &bits[6..] {
            out = out.or(clock_bit(&shared, bit));
        }
        assert_eq!(
            out,
            Some(Scancode { code: 0x1C, is_break: false, is_extended: false })
        );
        assert_eq!(shared.deferred_len(), 0);
        assert_eq!(shared.dropped_samples(), 0);
        assert!(shared.take_report().unwrap().is_key_pressed(0x04));
    }

    #[test]
    fn test_try_poll_link_counts_overflow() {
        let shared = SharedBridge::new(BridgeConfig::DEFAULT, true);
        shared.with(|_| {
            for _ in 0..DEFERRED_SAMPLES + 2 {
                assert_eq!(shared.try_poll_link(true, true), None);
            }
        });
        assert_eq!(shared.deferred_len(), DEFERRED_SAMPLES);
        assert_eq!(shared.dropped_samples(), 2);

        // 次にロックを取れた呼び出しで保留分が流れる
        assert_eq!(shared.try_poll_link(true, true), None);
        assert_eq!(shared.deferred_len(), 0);
    }

    #[test]
    fn test_bridge_rollover_policy_from_config() {
        let config = BridgeConfig::DEFAULT.with_rollover(RolloverPolicy::ReportError);
        let mut bridge = Ps2HidBridge::new(config, true);
        for b in [0x1C, 0x1B, 0x23, 0x2B, 0x3B, 0x42, 0x4B] {
            bridge.feed_byte(b);
        }
        assert!(bridge.snapshot().is_rollover_error());
        assert_eq!(bridge.keyboard().pressed_count(), 6);
    }
}
