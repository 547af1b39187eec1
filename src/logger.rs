// ============================================================================
// src/logger.rs - Bridge Logging using the `log` crate
// ============================================================================
//!
//! ブリッジ用ロギング。
//!
//! ## 機能
//! - `log`クレートを使用した標準的なログインターフェース
//! - 出力先はボード側が渡すシンク関数（UART、RTT など）
//! - コンパイル時のログレベル上限（`verbose_logging` フィーチャー）
//! - 実行時のログレベル変更
//! - Spinlockでシンク呼び出しを直列化
//!
//! ## 使用方法
//! ```rust,ignore
//! fn uart_write(s: &str) { /* ボード固有 */ }
//!
//! ps2_hid_bridge::logger::init(uart_write)?;
//! log::info!("bridge up");
//! ```

use core::fmt::Write;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use log::{Level, LevelFilter, Log, Metadata, Record};
use spin::Mutex;

use crate::config::MAX_LOG_LEVEL;
use crate::error::Result;

/// ログ出力先（ボード側で実装）
pub type LogSink = fn(&str);

// ============================================================================
// ロガー状態管理
// ============================================================================

/// ロガーの初期化状態
static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// 現在のログレベル（実行時変更可能）
static CURRENT_LOG_LEVEL: AtomicU8 = AtomicU8::new(LevelFilter::Info as u8);

/// 出力先シンク
///
/// 割り込みコンテキストからのログとメインループのログが混ざらないよう
/// 1レコード単位でロックする。ロック中に来たレコード（ISRからの再入など）は捨てる。
static SINK: Mutex<Option<LogSink>> = Mutex::new(None);

// ============================================================================
// ロガー実装
// ============================================================================

/// ブリッジ用ロガー
struct BridgeLogger;

impl BridgeLogger {
    /// ログレベルのプレフィックスを取得
    fn level_prefix(level: Level) -> &'static str {
        match level {
            Level::Error => "[ERROR] ",
            Level::Warn  => "[WARN]  ",
            Level::Info  => "[INFO]  ",
            Level::Debug => "[DEBUG] ",
            Level::Trace => "[TRACE] ",
        }
    }
}

/// シンクへ `fmt::Write` で流すためのアダプタ
struct SinkWriter(LogSink);

impl Write for SinkWriter {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        (self.0)(s);
        Ok(())
    }
}

impl Log for BridgeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= current_log_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        // 再入時に回り続けないよう try_lock
        let Some(guard) = SINK.try_lock() else {
            return;
        };
        let Some(sink) = *guard else {
            return;
        };

        let mut writer = SinkWriter(sink);
        let _ = writer.write_str(Self::level_prefix(record.level()));
        if let Some(module) = record.module_path() {
            let _ = write!(writer, "[{}] ", module);
        }
        let _ = write!(writer, "{}\r\n", record.args());
    }

    fn flush(&self) {}
}

/// グローバルロガーインスタンス
static LOGGER: BridgeLogger = BridgeLogger;

// ============================================================================
// 公開API
// ============================================================================

/// ロギングシステムを初期化
///
/// 二度目以降の呼び出しは `BridgeError::LoggerAlreadySet` を返す。
pub fn init(sink: LogSink) -> Result<()> {
    log::set_logger(&LOGGER)?;
    *SINK.lock() = Some(sink);
    log::set_max_level(MAX_LOG_LEVEL);
    CURRENT_LOG_LEVEL.store(MAX_LOG_LEVEL as u8, Ordering::SeqCst);
    LOGGER_INITIALIZED.store(true, Ordering::SeqCst);
    Ok(())
}

/// 実行時にログレベルを変更
///
/// コンパイル時の上限 `MAX_LOG_LEVEL` を超える値は上限に丸める。
pub fn set_log_level(level: LevelFilter) {
    let level = level.min(MAX_LOG_LEVEL);
    CURRENT_LOG_LEVEL.store(level as u8, Ordering::SeqCst);
    log::set_max_level(level);
}

/// 現在のログレベルを取得
pub fn current_log_level() -> LevelFilter {
    LevelFilter::iter()
        .nth(CURRENT_LOG_LEVEL.load(Ordering::Relaxed) as usize)
        .unwrap_or(LevelFilter::Info)
}

/// ロガーが初期化済みかどうか
pub fn is_initialized() -> bool {
    LOGGER_INITIALIZED.load(Ordering::Relaxed)
}
