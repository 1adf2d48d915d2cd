//! Error types for state database processing

use crate::bucket::Bucket;

/// 状態DBの読み込み・サンプリングで発生するエラー
///
/// 破損データは全て致命的エラーとして扱い、読み飛ばしは行わない。
#[derive(thiserror::Error, Debug)]
pub enum StateDbError {
    /// state_size が 3 以外
    #[error("malformed record #{index}: state_size={state_size} (expected 3)")]
    MalformedRecord { index: u64, state_size: u32 },

    /// レコード境界の途中でストリームが終わった
    #[error("truncated stream: record #{index} has {got} of {expected} bytes")]
    TruncatedStream {
        index: u64,
        got: usize,
        expected: usize,
    },

    /// state[2] が 7bit に収まらない
    #[error("invalid state in record #{index}: state[2]={value:#x} exceeds 7 bits")]
    InvalidState { index: u64, value: u64 },

    /// 採用確率が [0, 1] の範囲外
    #[error("invalid keep probability for {bucket}: {value}")]
    InvalidProbability { bucket: Bucket, value: f64 },

    /// 設定値の不整合
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// 予測値とラベルの件数不一致
    #[error("length mismatch: {predictions} predictions vs {labels} labels")]
    LengthMismatch { predictions: usize, labels: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

/// Result type for state database operations
pub type Result<T> = std::result::Result<T, StateDbError>;
