// ============================================================================
// src/config.rs - Bridge Configuration
// ============================================================================
//!
//! ブリッジ設定。
//!
//! 実行時に変えたいものは `BridgeConfig` に、ビルド時に決まるものは
//! cargo フィーチャー（`verbose_logging`）に置く。

use log::LevelFilter;

use crate::error::{BridgeError, Result};

/// 既定のレポート送信周期 (ms)
pub const DEFAULT_REPORT_INTERVAL_MS: u32 = 10;

/// コンパイル時のログレベル上限（featureで変更可能）
#[cfg(feature = "verbose_logging")]
pub const MAX_LOG_LEVEL: LevelFilter = LevelFilter::Trace;

#[cfg(not(feature = "verbose_logging"))]
pub const MAX_LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// 7キー目以降の同時押しの扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RolloverPolicy {
    /// 黙って捨てる（レポートは直前の6キーのまま）
    #[default]
    Drop,
    /// あふれている間、キースロットを全て ErrorRollOver (0x01) で報告する
    ReportError,
}

/// ブリッジ設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeConfig {
    /// HIDレポート送信周期 (ms)
    pub report_interval_ms: u32,
    /// ロールオーバー時の挙動
    pub rollover: RolloverPolicy,
}

impl BridgeConfig {
    /// 既定設定（10ms周期、ロールオーバーは破棄）
    pub const DEFAULT: Self = Self {
        report_interval_ms: DEFAULT_REPORT_INTERVAL_MS,
        rollover: RolloverPolicy::Drop,
    };

    /// 送信周期を設定
    pub const fn with_report_interval(mut self, interval_ms: u32) -> Self {
        self.report_interval_ms = interval_ms;
        self
    }

    /// ロールオーバー挙動を設定
    pub const fn with_rollover(mut self, rollover: RolloverPolicy) -> Self {
        self.rollover = rollover;
        self
    }

    /// 設定値を検証
    pub fn validate(&self) -> Result<()> {
        if self.report_interval_ms == 0 {
            return Err(BridgeError::InvalidReportInterval);
        }
        Ok(())
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
