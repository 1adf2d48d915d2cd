//! build_dataset - states.db から学習データを作る
//!
//! 復号 → バケット分類 → 確率サンプリング → 特徴量展開 → 書き出し。
//!
//! # 使用例
//!
//! ```bash
//! # 既定（stratified プリセット、jsonl 出力）
//! cargo run -p tools --bin build_dataset -- --input states.db --output train.jsonl
//!
//! # 全件採用、f32le 形式、シード固定、並列処理
//! cargo run -p tools --bin build_dataset -- \
//!   --input states.db --output train.f32 --format f32le \
//!   --preset all --pseudo-prop-skip 0 --seed 42 --parallel-chunk 65536
//!
//! # 設定ファイル
//! cargo run -p tools --bin build_dataset -- --config statedb.toml --output train.jsonl.gz
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use tools::collect::{CollectOptions, collect_dataset};
use tools::common::args::PipelineArgs;
use tools::export::{ExportFormat, write_dataset};

#[derive(Parser)]
#[command(
    name = "build_dataset",
    version,
    about = "states.db からサンプリングした学習データを書き出す"
)]
struct Cli {
    /// 入力ファイル（`-` で標準入力、`.gz` 可）
    #[arg(short, long, default_value = "states.db")]
    input: PathBuf,

    /// 出力ファイル（`-` で標準出力、`.gz` なら圧縮）
    #[arg(short, long)]
    output: PathBuf,

    /// 出力形式: jsonl | f32le
    #[arg(long, default_value = "jsonl")]
    format: ExportFormat,

    /// 入力全体を読み込み、このレコード数ごとに並列処理する
    #[arg(long)]
    parallel_chunk: Option<usize>,

    /// 進捗バーを表示しない
    #[arg(short, long)]
    quiet: bool,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = cli.pipeline.resolve()?;

    let opts = CollectOptions {
        parallel_chunk: cli.parallel_chunk,
        quiet: cli.quiet,
    };
    let (dataset, report) = collect_dataset(&cli.input, &config, opts)?;

    write_dataset(&cli.output, &dataset, &config, cli.format, Some(&report))?;

    eprintln!("{report}");
    eprintln!(
        "Output: {} ({} samples x {} features, {})",
        cli.output.display(),
        dataset.len(),
        dataset.feature_count(),
        cli.format
    );
    Ok(())
}
