//! 連続したレコード範囲ごとの並列パス
//!
//! レコードの復号は1件ごとに独立しているので、入力を連続範囲（チャンク）に分けて
//! rayon で処理し、元の順序で連結する。チャンク i の乱数は
//! `ChaCha8Rng::seed_from_u64(seed)` のストリーム i を使うため、シードとチャンク
//! サイズが同じなら結果は毎回一致する。

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::config::PipelineConfig;
use crate::dataset::Dataset;
use crate::error::{Result, StateDbError};
use crate::pipeline::{PassReport, Pipeline};
use crate::record::RawRecord;

/// 1チャンクあたりの既定レコード数
pub const DEFAULT_RECORDS_PER_CHUNK: usize = 1 << 16;

/// メモリ上のレコード列を並列に処理する
///
/// 複数チャンクでエラーが起きた場合は、最も前のチャンクのエラーを返す。
/// 末尾に半端なバイトがあれば、全チャンクが成功した後で `TruncatedStream` を返す。
pub fn run_parallel(
    bytes: &[u8],
    config: &PipelineConfig,
    seed: u64,
    records_per_chunk: usize,
) -> Result<(Dataset, PassReport)> {
    let size = config.layout.size();
    let whole = bytes.len() / size;
    let tail = bytes.len() % size;
    // whole 件を超えるチャンクは1つにまとめる（chunk * size が入力長を超えない）
    let records_per_chunk = records_per_chunk.clamp(1, whole.max(1));

    let chunk_results: Vec<Result<(Dataset, PassReport)>> = bytes[..whole * size]
        .par_chunks(records_per_chunk * size)
        .enumerate()
        .map(|(chunk_idx, chunk)| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            rng.set_stream(chunk_idx as u64);
            let first_index = (chunk_idx * records_per_chunk) as u64;
            process_chunk(chunk, config, rng, first_index)
        })
        .collect();

    log::debug!(
        "parallel pass: {} records in {} chunks",
        whole,
        chunk_results.len()
    );

    let chunks = chunk_results.into_iter().collect::<Result<Vec<_>>>()?;
    let sampled: usize = chunks.iter().map(|(ds, _)| ds.len()).sum();
    let mut dataset = Dataset::with_capacity(config.features.feature_count(), sampled);
    let mut report = PassReport::default();
    for (chunk_ds, chunk_report) in chunks {
        dataset.extend(chunk_ds)?;
        report += chunk_report;
    }

    if tail != 0 {
        return Err(StateDbError::TruncatedStream {
            index: whole as u64,
            got: tail,
            expected: size,
        });
    }
    Ok((dataset, report))
}

fn process_chunk(
    chunk: &[u8],
    config: &PipelineConfig,
    rng: ChaCha8Rng,
    first_index: u64,
) -> Result<(Dataset, PassReport)> {
    let size = config.layout.size();
    let mut pipeline = Pipeline::new(*config, rng)?;
    let mut dataset = pipeline.new_dataset();
    for (offset, rec_bytes) in chunk.chunks_exact(size).enumerate() {
        let index = first_index + offset as u64;
        let record = RawRecord::decode(rec_bytes, config.layout, index)?;
        pipeline.process_record(&record, index, &mut dataset)?;
    }
    Ok((dataset, pipeline.into_report()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordLayout;
    use crate::sampler::KeepProbabilities;
    use std::io::Cursor;

    fn synthetic(n: usize, layout: RecordLayout) -> Vec<u8> {
        (0..n)
            .flat_map(|i| {
                let terminal = i % 7 == 0;
                let complete = i % 5 == 0;
                let score = (i % 120) as f64;
                RawRecord::new(terminal, complete, i as i64, score, [i as u64, !(i as u64), (i % 128) as u64])
                    .encode(layout)
            })
            .collect()
    }

    #[test]
    fn test_keep_all_matches_sequential_pass() {
        let bytes = synthetic(1000, RecordLayout::Compact);
        let config = PipelineConfig::keep_all(RecordLayout::Compact, 5).unwrap();

        let mut pipeline = Pipeline::new(config, ChaCha8Rng::seed_from_u64(0)).unwrap();
        let mut sequential = pipeline.new_dataset();
        pipeline.run(Cursor::new(&bytes), &mut sequential).unwrap();

        for chunk in [1, 7, 64, 5000] {
            let (ds, report) = run_parallel(&bytes, &config, 11, chunk).unwrap();
            assert_eq!(ds, sequential, "chunk size {chunk}");
            assert_eq!(&report, pipeline.report());
        }
    }

    #[test]
    fn test_sampled_output_is_reproducible() {
        let bytes = synthetic(2000, RecordLayout::Wide);
        let mut config = PipelineConfig::keep_all(RecordLayout::Wide, 0).unwrap();
        config.keep = KeepProbabilities::uniform(0.5);

        let (a, ra) = run_parallel(&bytes, &config, 99, 128).unwrap();
        let (b, rb) = run_parallel(&bytes, &config, 99, 128).unwrap();
        assert_eq!(a, b);
        assert_eq!(ra, rb);
        assert_eq!(ra.decoded, 2000);
        assert!(ra.sampled > 800 && ra.sampled < 1200);
    }

    #[test]
    fn test_earliest_chunk_error_wins() {
        let mut recs: Vec<RawRecord> = (0..40)
            .map(|i| RawRecord::new(false, false, i, 50.0, [0, 0, 0]))
            .collect();
        recs[12].state_size = 4;
        recs[33].state[2] = 1000;
        let bytes: Vec<u8> = recs.iter().flat_map(|r| r.encode(RecordLayout::Compact)).collect();
        let config = PipelineConfig::keep_all(RecordLayout::Compact, 5).unwrap();

        let err = run_parallel(&bytes, &config, 0, 10).unwrap_err();
        assert!(matches!(err, StateDbError::MalformedRecord { index: 12, state_size: 4 }));
    }

    #[test]
    fn test_trailing_bytes_are_truncation() {
        let mut bytes = synthetic(10, RecordLayout::Compact);
        bytes.extend_from_slice(&[1, 2, 3]);
        let config = PipelineConfig::keep_all(RecordLayout::Compact, 5).unwrap();
        assert!(matches!(
            run_parallel(&bytes, &config, 0, 4),
            Err(StateDbError::TruncatedStream { index: 10, got: 3, expected: 42 })
        ));
    }

    #[test]
    fn test_huge_chunk_size_is_one_chunk() {
        let bytes = synthetic(3, RecordLayout::Compact);
        let config = PipelineConfig::keep_all(RecordLayout::Compact, 5).unwrap();
        let (ds, report) = run_parallel(&bytes, &config, 0, usize::MAX).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(report.decoded, 3);

        let (empty, _) = run_parallel(&[], &config, 0, usize::MAX).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_empty_input() {
        let config = PipelineConfig::default();
        let (ds, report) = run_parallel(&[], &config, 0, 16).unwrap();
        assert!(ds.is_empty());
        assert_eq!(report, PassReport::default());
    }
}
