//! 統一エラーハンドリングモジュール
//!
//! ブリッジの外部境界（レポート書き出し、設定、ロガー初期化）で使用する
//! エラー型を定義します。フレームデコーダとキーボード状態トラッカーは
//! 異常をすべて内部で吸収するため、このエラー型を返しません。

use core::fmt;

/// ブリッジ全体の統一エラー型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeError {
    /// 出力バッファがレポート長より短い
    BufferTooSmall {
        /// 必要なバイト数
        needed: usize,
        /// 渡されたバッファ長
        got: usize,
    },
    /// レポート送信周期が0ms
    InvalidReportInterval,
    /// グローバルロガーが既に設定済み
    LoggerAlreadySet,
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::BufferTooSmall { needed, got } => {
                write!(f, "buffer too small: need {} bytes, got {}", needed, got)
            }
            BridgeError::InvalidReportInterval => write!(f, "report interval must be non-zero"),
            BridgeError::LoggerAlreadySet => write!(f, "logger already set"),
        }
    }
}

// ===== 既存エラー型からの変換 =====

impl From<log::SetLoggerError> for BridgeError {
    fn from(_: log::SetLoggerError) -> Self {
        BridgeError::LoggerAlreadySet
    }
}

// ===== Result type alias =====

/// ブリッジの結果型エイリアス
pub type Result<T> = core::result::Result<T, BridgeError>;
