//! train_baseline - サンプリングしたデータで線形ベースラインを学習し誤差を表示
//!
//! 定数（学習データのラベル平均）予測との比較で、データに学習可能な信号が
//! あるかを確認する。
//!
//! # 使用例
//!
//! ```bash
//! cargo run -p tools --bin train_baseline -- --input states.db --seed 1
//! cargo run -p tools --bin train_baseline -- --input states.db --preset all --epochs 10 --lr 0.1
//! ```

use anyhow::{Result, bail};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

use statedb_core::{ErrorStats, PassReport};
use tools::baseline::{BaselineConfig, LinearBaseline};
use tools::collect::{CollectOptions, collect_dataset};
use tools::common::args::{PipelineArgs, SHUFFLE_STREAM, make_stream_rng};

#[derive(Parser)]
#[command(name = "train_baseline", version, about = "線形ベースラインの学習と誤差評価")]
struct Cli {
    /// 入力ファイル（`-` で標準入力、`.gz` 可）
    #[arg(short, long, default_value = "states.db")]
    input: PathBuf,

    #[arg(long, default_value_t = 3)]
    epochs: usize,

    #[arg(long, default_value_t = 0.05)]
    lr: f32,

    #[arg(long, default_value_t = 1e-6)]
    l2: f32,

    /// 検証用に取り分ける割合 [0, 1)
    #[arg(long, default_value_t = 0.1)]
    valid_fraction: f64,

    /// 入力全体を読み込み、このレコード数ごとに並列処理する
    #[arg(long)]
    parallel_chunk: Option<usize>,

    /// 結果を JSON で標準出力に書く
    #[arg(long)]
    json: bool,

    /// 進捗バーを表示しない
    #[arg(short, long)]
    quiet: bool,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Serialize)]
struct Summary {
    report: PassReport,
    train_samples: usize,
    valid_samples: usize,
    epoch_mse: Vec<f64>,
    train: Option<ErrorStats>,
    valid: Option<ErrorStats>,
    constant: Option<ErrorStats>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = cli.pipeline.resolve()?;

    let opts = CollectOptions {
        parallel_chunk: cli.parallel_chunk,
        quiet: cli.quiet,
    };
    let (mut train, report) = collect_dataset(&cli.input, &config, opts)?;
    eprintln!("{report}");
    if train.is_empty() {
        bail!("No samples were kept from {}", cli.input.display());
    }

    let mut rng = make_stream_rng(config.seed, SHUFFLE_STREAM);
    train.shuffle(&mut rng);
    let valid = train.split_off_validation(cli.valid_fraction)?;
    eprintln!("Train: {} samples, valid: {} samples", train.len(), valid.len());

    let cfg = BaselineConfig {
        epochs: cli.epochs,
        lr: cli.lr,
        l2: cli.l2,
    };
    let mut model = LinearBaseline::new(train.feature_count());
    let epoch_mse = model.fit(&train, &cfg, &mut rng);
    for (ep, mse) in epoch_mse.iter().enumerate() {
        eprintln!("epoch {}: MSE={:.6}", ep + 1, mse);
    }

    let train_stats = ErrorStats::from_predictions(&model.predict_all(&train), train.labels())?;
    let valid_stats = ErrorStats::from_predictions(&model.predict_all(&valid), valid.labels())?;
    // 学習データの平均ラベルを、検証データ（なければ学習データ）に当てる
    let reference = if valid.is_empty() { &train } else { &valid };
    let constant = train
        .mean_label()
        .and_then(|mean| ErrorStats::for_constant(mean, reference.labels()));

    if cli.json {
        let summary = Summary {
            report,
            train_samples: train.len(),
            valid_samples: valid.len(),
            epoch_mse,
            train: train_stats,
            valid: valid_stats,
            constant,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    for (name, stats) in [("Train", train_stats), ("Valid", valid_stats), ("Constant", constant)] {
        match stats {
            Some(s) => println!("{name}: {s}"),
            None => println!("{name}: n/a"),
        }
    }
    Ok(())
}
