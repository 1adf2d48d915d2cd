//! 入力ファイル → データセット

use std::path::Path;

use anyhow::{Context, Result};

use statedb_core::parallel::run_parallel;
use statedb_core::{Dataset, PassReport, Pipeline, PipelineConfig, RecordReader};

use crate::common::args::{make_rng, resolve_seed};
use crate::common::io::{input_len_hint, open_input, read_input};
use crate::common::progress::record_progress;

/// 進捗バーを更新する間隔（レコード数）
const PROGRESS_TICK: u64 = 4096;

#[derive(Debug, Clone, Copy, Default)]
pub struct CollectOptions {
    /// Some なら入力全体を読み込み、このレコード数ごとに並列処理する
    pub parallel_chunk: Option<usize>,
    pub quiet: bool,
}

/// 入力を1パス処理して採用サンプルを集める
///
/// 逐次パスでは、エラーになったレコードの位置をコンテキストに含めて返す。
pub fn collect_dataset(
    input: &Path,
    config: &PipelineConfig,
    opts: CollectOptions,
) -> Result<(Dataset, PassReport)> {
    match opts.parallel_chunk {
        Some(chunk) => collect_parallel(input, config, chunk),
        None => collect_sequential(input, config, opts.quiet),
    }
}

fn collect_sequential(input: &Path, config: &PipelineConfig, quiet: bool) -> Result<(Dataset, PassReport)> {
    let reader = open_input(input).with_context(|| format!("Failed to open {}", input.display()))?;
    let total = input_len_hint(input).map(|len| len / config.layout.size() as u64);
    let pb = record_progress(total, quiet);

    let mut pipeline = Pipeline::new(*config, make_rng(config.seed))?;
    let mut dataset = pipeline.new_dataset();
    let mut records = RecordReader::new(reader, config.layout);
    let mut index = 0u64;
    while let Some(record) = records
        .read_record()
        .with_context(|| format!("Failed to read {} at record {index}", input.display()))?
    {
        pipeline.process_record(&record, index, &mut dataset)?;
        index += 1;
        if index % PROGRESS_TICK == 0 {
            pb.set_position(index);
        }
    }
    pb.set_position(index);
    pb.finish_with_message(format!("sampled {}", dataset.len()));

    log::info!("decoded {index} records from {}", input.display());
    Ok((dataset, pipeline.into_report()))
}

fn collect_parallel(input: &Path, config: &PipelineConfig, chunk: usize) -> Result<(Dataset, PassReport)> {
    let bytes = read_input(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let seed = resolve_seed(config.seed);
    log::info!(
        "parallel pass: {} bytes, {} records per chunk, seed {seed}",
        bytes.len(),
        chunk
    );
    let result = run_parallel(&bytes, config, seed, chunk)
        .with_context(|| format!("Failed to process {}", input.display()))?;
    Ok(result)
}
