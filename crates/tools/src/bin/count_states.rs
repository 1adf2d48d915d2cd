//! count_states - states.db のバケット別件数を数える
//!
//! サンプリングや特徴量展開は行わず、全レコードを復号して分類だけする。
//!
//! # 使用例
//!
//! ```bash
//! cargo run -p tools --bin count_states -- --input states.db
//!
//! # 46バイト形式、JSON で出力
//! cargo run -p tools --bin count_states -- --input states.db.gz --layout wide --json
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

use statedb_core::{BucketCounts, RecordLayout, RecordReader};
use tools::common::io::{input_len_hint, open_input};
use tools::common::progress::record_progress;

#[derive(Parser)]
#[command(name = "count_states", version, about = "states.db のバケット別件数を表示")]
struct Cli {
    /// 入力ファイル（`-` で標準入力、`.gz` 可）
    #[arg(short, long, default_value = "states.db")]
    input: PathBuf,

    /// レコード形式: compact (42B) | wide (46B)
    #[arg(long, default_value = "compact")]
    layout: RecordLayout,

    /// JSON で出力
    #[arg(long)]
    json: bool,

    /// 進捗バーを表示しない
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Serialize)]
struct Census {
    input: String,
    layout: RecordLayout,
    record_size: usize,
    records: u64,
    counts: BucketCounts,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let reader = open_input(&cli.input).with_context(|| format!("Failed to open {}", cli.input.display()))?;
    let size = cli.layout.size();
    let total = input_len_hint(&cli.input).map(|len| len / size as u64);
    let pb = record_progress(total, cli.quiet);

    let mut counts = BucketCounts::default();
    let mut records = RecordReader::new(reader, cli.layout);
    while let Some(record) = records
        .read_record()
        .with_context(|| format!("Failed to read {} at record {}", cli.input.display(), records.records_read()))?
    {
        counts.classify(&record);
        if records.records_read() % 4096 == 0 {
            pb.set_position(records.records_read());
        }
    }
    pb.finish_and_clear();
    log::info!("{} records x {} bytes", records.records_read(), size);

    if cli.json {
        let census = Census {
            input: cli.input.display().to_string(),
            layout: cli.layout,
            record_size: size,
            records: records.records_read(),
            counts,
        };
        println!("{}", serde_json::to_string_pretty(&census)?);
    } else {
        println!("{counts}");
        println!("Total: {} records ({} bytes each)", counts.total(), size);
    }
    Ok(())
}
