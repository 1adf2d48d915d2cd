//! データセットの書き出し
//!
//! - `jsonl`: 1行1サンプル `{"features":[...],"label":x}`
//! - `f32le`: 1サンプル = 特徴量 `feature_count` 個 + ラベル1個の little-endian f32。
//!   レイアウト情報は `<output>.meta.json` に書く。

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use byteorder::{LittleEndian, WriteBytesExt};
use serde::{Deserialize, Serialize};

use statedb_core::{Dataset, PassReport, PipelineConfig, RecordLayout};

use crate::common::io::create_output;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Jsonl,
    F32le,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Jsonl => "jsonl",
            ExportFormat::F32le => "f32le",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jsonl" | "json" => Ok(ExportFormat::Jsonl),
            "f32le" | "bin" => Ok(ExportFormat::F32le),
            other => Err(format!("unknown export format: {other} (expected jsonl|f32le)")),
        }
    }
}

#[derive(Serialize)]
struct JsonSample<'a> {
    features: &'a [f32],
    label: f32,
}

/// f32le 出力のサイドカー
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMeta {
    pub samples: usize,
    pub feature_count: usize,
    pub layout: RecordLayout,
    pub pseudo_prop_skip: u32,
    pub format: String,
    /// サンプリング前後の集計
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<serde_json::Value>,
}

impl DatasetMeta {
    pub fn new(dataset: &Dataset, config: &PipelineConfig, format: ExportFormat, report: Option<&PassReport>) -> Self {
        Self {
            samples: dataset.len(),
            feature_count: dataset.feature_count(),
            layout: config.layout,
            pseudo_prop_skip: config.features.pseudo_prop_skip(),
            format: format.to_string(),
            report: report.and_then(|r| serde_json::to_value(r).ok()),
        }
    }
}

/// `out.f32` → `out.f32.meta.json`（`.gz` はそのまま残す）
pub fn meta_path(output: &Path) -> PathBuf {
    let mut s = output.as_os_str().to_owned();
    s.push(".meta.json");
    PathBuf::from(s)
}

/// サンプルを `w` に書き出す
pub fn write_samples<W: Write>(w: &mut W, dataset: &Dataset, format: ExportFormat) -> Result<()> {
    match format {
        ExportFormat::Jsonl => {
            for (features, &label) in dataset.features().iter().zip(dataset.labels()) {
                serde_json::to_writer(&mut *w, &JsonSample { features, label })?;
                w.write_all(b"\n")?;
            }
        }
        ExportFormat::F32le => {
            for (features, &label) in dataset.features().iter().zip(dataset.labels()) {
                for &x in features {
                    w.write_f32::<LittleEndian>(x)?;
                }
                w.write_f32::<LittleEndian>(label)?;
            }
        }
    }
    Ok(())
}

/// データセットをファイル（`-` は標準出力）に書き出す
///
/// f32le 形式でファイル出力する場合はサイドカーも書く。
pub fn write_dataset(
    output: &Path,
    dataset: &Dataset,
    config: &PipelineConfig,
    format: ExportFormat,
    report: Option<&PassReport>,
) -> Result<()> {
    let mut out = create_output(output).with_context(|| format!("Failed to create {}", output.display()))?;
    write_samples(&mut out, dataset, format)?;
    out.close()
        .with_context(|| format!("Failed to finalize {}", output.display()))?;

    if format == ExportFormat::F32le && output.to_string_lossy() != "-" {
        let meta = DatasetMeta::new(dataset, config, format, report);
        let path = meta_path(output);
        let json = serde_json::to_string_pretty(&meta)?;
        std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("wrote {}", path.display());
    }
    Ok(())
}
