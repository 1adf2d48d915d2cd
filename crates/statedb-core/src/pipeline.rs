//! 復号 → 分類 → サンプリング → 展開 の逐次パス

use std::fmt;
use std::io::Read;
use std::ops::AddAssign;

use rand::Rng;
use serde::Serialize;

use crate::bucket::BucketCounts;
use crate::config::PipelineConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::features::label_for_score;
use crate::reader::RecordReader;
use crate::record::RawRecord;
use crate::sampler::Sampler;

/// 1パス分の集計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    /// サンプリング前のバケット別件数
    pub counts: BucketCounts,
    /// 復号したレコード数
    pub decoded: u64,
    /// 採用したサンプル数
    pub sampled: u64,
}

impl AddAssign for PassReport {
    fn add_assign(&mut self, rhs: Self) {
        self.counts += rhs.counts;
        self.decoded += rhs.decoded;
        self.sampled += rhs.sampled;
    }
}

impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.counts)?;
        write!(f, "Decoded: {}, sampled: {}", self.decoded, self.sampled)
    }
}

/// サンプリング付きの学習データ生成器
pub struct Pipeline<R> {
    config: PipelineConfig,
    sampler: Sampler<R>,
    report: PassReport,
}

impl<R: Rng> Pipeline<R> {
    pub fn new(config: PipelineConfig, rng: R) -> Result<Self> {
        let sampler = Sampler::new(config.keep, rng)?;
        Ok(Self {
            config,
            sampler,
            report: PassReport::default(),
        })
    }

    /// 新しい空のデータセット
    pub fn new_dataset(&self) -> Dataset {
        Dataset::new(self.config.features.feature_count())
    }

    pub fn report(&self) -> &PassReport {
        &self.report
    }

    pub fn into_report(self) -> PassReport {
        self.report
    }

    /// 1レコード分の処理。採用されたら `out` に追加して true を返す
    ///
    /// `index` はエラーメッセージ用のレコード番号。
    pub fn process_record(&mut self, record: &RawRecord, index: u64, out: &mut Dataset) -> Result<bool> {
        self.report.decoded += 1;
        let bucket = self.report.counts.classify(record);
        if !self.sampler.keep(bucket) {
            return Ok(false);
        }

        let mut features = Vec::with_capacity(self.config.features.feature_count());
        self.config.features.expand_into(&record.state, index, &mut features)?;
        out.push(features, label_for_score(record.score));
        self.report.sampled += 1;
        Ok(true)
    }

    /// ストリームを最後まで処理して `out` に追記する
    ///
    /// エラー時、`out` にはエラーとなったレコードより前の採用分だけが残る。
    pub fn run<I: Read>(&mut self, input: I, out: &mut Dataset) -> Result<()> {
        let mut reader = RecordReader::new(input, self.config.layout);
        while let Some(record) = reader.read_record()? {
            let index = reader.records_read() - 1;
            self.process_record(&record, index, out)?;
        }
        log::info!(
            "pass finished: decoded={} sampled={}",
            self.report.decoded,
            self.report.sampled
        );
        Ok(())
    }
}
