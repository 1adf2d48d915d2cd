//! # statedb-core
//!
//! 探索エンジンが記録した状態DB（`states.db`）から評価関数の学習データを作るライブラリ。
//!
//! ## モジュール構成
//!
//! - `record`: 固定長ビッグエンディアンレコードの復号
//! - `reader`: ストリームからの逐次読み込み
//! - `bucket`: 終局/確定/推定のバケット分類
//! - `sampler`: バケット別の確率サンプリング
//! - `features`: パック済み状態 → 特徴量ベクトル
//! - `pipeline`: 復号 → 分類 → サンプリング → 展開
//! - `parallel`: レコード範囲ごとの並列パス
//! - `dataset`: 特徴量・ラベルの保持とバッチ化
//! - `stats`: 予測誤差の統計
//! - `config`: TOML 設定と CLI 上書きの統合
//!

pub mod bucket;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod parallel;
pub mod pipeline;
pub mod reader;
pub mod record;
pub mod sampler;
pub mod stats;

pub use bucket::{Bucket, BucketCounts};
pub use config::{ConfigOverrides, KeepOverrides, PipelineConfig, StateDbConfigFile, merge_config};
pub use dataset::Dataset;
pub use error::{Result, StateDbError};
pub use features::FeatureLayout;
pub use pipeline::{PassReport, Pipeline};
pub use reader::RecordReader;
pub use record::{RawRecord, RecordLayout};
pub use sampler::{KeepProbabilities, Sampler, SamplingPreset};
pub use stats::ErrorStats;
