//! パイプライン設定
//!
//! TOML ファイルとコマンドライン引数を統合する。優先順位は
//! CLI > ファイル > プリセット既定値。
//!
//! ```toml
//! layout = "compact"
//! pseudo_prop_skip = 5
//! preset = "stratified"
//! seed = 42
//!
//! [keep]
//! terminal_win = 0.002
//! estimate = 1.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bucket::Bucket;
use crate::error::Result;
use crate::features::{DEFAULT_PSEUDO_PROP_SKIP, FeatureLayout};
use crate::record::RecordLayout;
use crate::sampler::{KeepProbabilities, SamplingPreset};

/// バケット別採用確率の上書き（未指定はプリセット値）
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeepOverrides {
    #[serde(default)]
    pub terminal_win: Option<f64>,
    #[serde(default)]
    pub terminal_loss: Option<f64>,
    #[serde(default)]
    pub complete_win: Option<f64>,
    #[serde(default)]
    pub complete_loss: Option<f64>,
    #[serde(default)]
    pub estimate: Option<f64>,
}

impl KeepOverrides {
    fn get(&self, bucket: Bucket) -> Option<f64> {
        match bucket {
            Bucket::TerminalWin => self.terminal_win,
            Bucket::TerminalLoss => self.terminal_loss,
            Bucket::CompleteWin => self.complete_win,
            Bucket::CompleteLoss => self.complete_loss,
            Bucket::Estimate => self.estimate,
        }
    }

    fn apply(&self, probs: &mut KeepProbabilities) {
        for bucket in Bucket::ALL {
            if let Some(p) = self.get(bucket) {
                probs.set(bucket, p);
            }
        }
    }
}

/// 設定ファイルの内容（全項目省略可）
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateDbConfigFile {
    #[serde(default)]
    pub layout: Option<RecordLayout>,
    #[serde(default)]
    pub pseudo_prop_skip: Option<u32>,
    #[serde(default)]
    pub preset: Option<SamplingPreset>,
    #[serde(default)]
    pub keep: KeepOverrides,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl StateDbConfigFile {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&data)
    }
}

/// コマンドラインからの上書き
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub layout: Option<RecordLayout>,
    pub pseudo_prop_skip: Option<u32>,
    pub preset: Option<SamplingPreset>,
    pub keep: KeepOverrides,
    pub seed: Option<u64>,
}

/// 検証済みのパイプライン設定
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PipelineConfig {
    pub layout: RecordLayout,
    pub features: FeatureLayout,
    pub keep: KeepProbabilities,
    pub seed: Option<u64>,
}

impl PipelineConfig {
    /// 全件採用の設定
    pub fn keep_all(layout: RecordLayout, pseudo_prop_skip: u32) -> Result<Self> {
        Ok(Self {
            layout,
            features: FeatureLayout::new(pseudo_prop_skip)?,
            keep: KeepProbabilities::uniform(1.0),
            seed: None,
        })
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            layout: RecordLayout::default(),
            features: FeatureLayout::default(),
            keep: KeepProbabilities::default(),
            seed: None,
        }
    }
}

/// ファイル設定と CLI 上書きを統合して検証する
///
/// プリセットを CLI で変えた場合も、個別確率はファイル→CLI の順に上書きされる。
pub fn merge_config(file: Option<StateDbConfigFile>, cli: ConfigOverrides) -> Result<PipelineConfig> {
    let file = file.unwrap_or_default();

    let layout = cli.layout.or(file.layout).unwrap_or_default();
    let skip = cli
        .pseudo_prop_skip
        .or(file.pseudo_prop_skip)
        .unwrap_or(DEFAULT_PSEUDO_PROP_SKIP);
    let preset = cli.preset.or(file.preset).unwrap_or_default();

    let mut keep = KeepProbabilities::from_preset(preset);
    file.keep.apply(&mut keep);
    cli.keep.apply(&mut keep);
    keep.validate()?;

    let config = PipelineConfig {
        layout,
        features: FeatureLayout::new(skip)?,
        keep,
        seed: cli.seed.or(file.seed),
    };
    log::debug!("merged config: {config:?} (preset={preset})");
    Ok(config)
}
