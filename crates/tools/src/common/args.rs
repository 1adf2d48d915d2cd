//! パイプライン設定の共通 CLI 引数
//!
//! 各バイナリの `Cli` に `#[command(flatten)]` で埋め込む。

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use statedb_core::{
    ConfigOverrides, KeepOverrides, PipelineConfig, RecordLayout, SamplingPreset, StateDbConfigFile,
    merge_config,
};

#[derive(Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    /// TOML 設定ファイル（CLI 指定が優先）
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// レコード形式: compact (42B) | wide (46B)
    #[arg(long)]
    pub layout: Option<RecordLayout>,

    /// state[0] の下位何ビットを捨てるか（0..=64）
    #[arg(long)]
    pub pseudo_prop_skip: Option<u32>,

    /// 採用確率のプリセット: stratified | all | estimates-only
    #[arg(long)]
    pub preset: Option<SamplingPreset>,

    #[arg(long)]
    pub keep_terminal_win: Option<f64>,

    #[arg(long)]
    pub keep_terminal_loss: Option<f64>,

    #[arg(long)]
    pub keep_complete_win: Option<f64>,

    #[arg(long)]
    pub keep_complete_loss: Option<f64>,

    #[arg(long)]
    pub keep_estimate: Option<f64>,

    /// 乱数シード（省略時は OS の乱数で初期化）
    #[arg(long)]
    pub seed: Option<u64>,
}

impl PipelineArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            layout: self.layout,
            pseudo_prop_skip: self.pseudo_prop_skip,
            preset: self.preset,
            keep: KeepOverrides {
                terminal_win: self.keep_terminal_win,
                terminal_loss: self.keep_terminal_loss,
                complete_win: self.keep_complete_win,
                complete_loss: self.keep_complete_loss,
                estimate: self.keep_estimate,
            },
            seed: self.seed,
        }
    }

    /// 設定ファイルを読み、CLI 値で上書きした検証済み設定を返す
    pub fn resolve(&self) -> Result<PipelineConfig> {
        let file = match &self.config {
            Some(path) => Some(
                StateDbConfigFile::load(path)
                    .with_context(|| format!("Failed to load config: {}", path.display()))?,
            ),
            None => None,
        };
        let config = merge_config(file, self.overrides()).context("Invalid pipeline configuration")?;
        if let Some(seed) = config.seed {
            eprintln!("Using seed: {seed}");
        }
        log::info!(
            "layout={} record_size={} feature_count={} keep={:?}",
            config.layout,
            config.layout.size(),
            config.features.feature_count(),
            config.keep
        );
        Ok(config)
    }
}

/// サンプリング用の乱数ストリーム番号
pub const SAMPLING_STREAM: u64 = 0;
/// シャッフル・分割用の乱数ストリーム番号
pub const SHUFFLE_STREAM: u64 = 1;

/// シードがあれば再現可能な乱数、なければ OS 乱数で初期化
pub fn make_rng(seed: Option<u64>) -> ChaCha8Rng {
    make_stream_rng(seed, SAMPLING_STREAM)
}

/// 同じシードから用途ごとに独立したストリームを作る
pub fn make_stream_rng(seed: Option<u64>, stream: u64) -> ChaCha8Rng {
    match seed {
        Some(seed) => {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            rng.set_stream(stream);
            rng
        }
        None => ChaCha8Rng::from_os_rng(),
    }
}

/// 並列パス用のシード（未指定なら OS 乱数から1つ引く）
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    use rand::Rng;
    seed.unwrap_or_else(|| ChaCha8Rng::from_os_rng().random())
}
