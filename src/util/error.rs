//! 解析処理のエラー分類。
//!
//! どのエラーも解析呼び出しから同期的に返され、部分的な結果は返さない。
use thiserror::Error;

/// 解析エラー。
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// パラメータの組み合わせが不正（n-gram範囲、`train_p`など）
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// フィルタ後に語彙や特徴量が空になった
    #[error("insufficient data: {0}")]
    InsufficientData(String),
    /// 翻訳バックエンドに到達できない
    #[error("translation unavailable after {attempts} attempt(s): {message}")]
    TranslationUnavailable { attempts: usize, message: String },
    /// 翻訳バックエンドが要求を拒否した（4xx、応答の形式不正）
    #[error("translation rejected: {message}")]
    TranslationRejected { message: String },
    /// 言語リソース（辞書ファイル）が存在しない、または壊れている
    #[error("failed to load resource {path}: {message}")]
    ResourceLoad { path: String, message: String },
}

/// エラーの種類。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 時間をおけば成功しうる（翻訳サービスの一時的な障害）
    Retryable,
    /// 入力や設定を直さない限り失敗し続ける
    NonRetryable,
}

impl AnalysisError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub(crate) fn insufficient(message: impl Into<String>) -> Self {
        Self::InsufficientData(message.into())
    }

    /// オーケストレータが再投入を判断するための分類。
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TranslationUnavailable { .. } => ErrorKind::Retryable,
            Self::Configuration(_)
            | Self::InsufficientData(_)
            | Self::TranslationRejected { .. }
            | Self::ResourceLoad { .. } => ErrorKind::NonRetryable,
        }
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Retryable)
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
