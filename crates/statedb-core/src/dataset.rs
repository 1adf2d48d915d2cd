//! 学習用データセット
//!
//! 特徴量とラベルを同じ長さの2本の列として保持し、外部の学習器に渡す。

use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::{Result, StateDbError};

/// 特徴量・ラベルの組
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    feature_count: usize,
    features: Vec<Vec<f32>>,
    labels: Vec<f32>,
}

/// バッチ（元データへの参照）
pub struct DatasetBatch<'a> {
    pub features: &'a [Vec<f32>],
    pub labels: &'a [f32],
}

impl DatasetBatch<'_> {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Dataset {
    pub fn new(feature_count: usize) -> Self {
        Self {
            feature_count,
            features: Vec::new(),
            labels: Vec::new(),
        }
    }

    pub fn with_capacity(feature_count: usize, capacity: usize) -> Self {
        Self {
            feature_count,
            features: Vec::with_capacity(capacity),
            labels: Vec::with_capacity(capacity),
        }
    }

    /// サンプルを1件追加
    pub fn push(&mut self, features: Vec<f32>, label: f32) {
        debug_assert_eq!(features.len(), self.feature_count);
        self.features.push(features);
        self.labels.push(label);
    }

    /// 別のデータセットを末尾に連結
    pub fn extend(&mut self, other: Dataset) -> Result<()> {
        if !other.is_empty() && other.feature_count != self.feature_count {
            return Err(StateDbError::InvalidConfig(format!(
                "cannot concatenate datasets with {} and {} features",
                self.feature_count, other.feature_count
            )));
        }
        let (features, labels) = other.into_parts();
        self.features.extend(features);
        self.labels.extend(labels);
        Ok(())
    }

    /// サンプル数
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// 空かどうか
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    pub fn features(&self) -> &[Vec<f32>] {
        &self.features
    }

    pub fn labels(&self) -> &[f32] {
        &self.labels
    }

    pub fn into_parts(self) -> (Vec<Vec<f32>>, Vec<f32>) {
        (self.features, self.labels)
    }

    /// シャッフル（特徴量とラベルの対応は保つ）
    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.shuffle(rng);

        let mut features = std::mem::take(&mut self.features);
        let labels = std::mem::take(&mut self.labels);
        self.features = order.iter().map(|&i| std::mem::take(&mut features[i])).collect();
        self.labels = order.iter().map(|&i| labels[i]).collect();
    }

    /// 末尾 `fraction` 割を検証用として切り出す
    pub fn split_off_validation(&mut self, fraction: f64) -> Result<Dataset> {
        if !(0.0..1.0).contains(&fraction) {
            return Err(StateDbError::InvalidConfig(format!(
                "validation fraction must be in [0, 1), got {fraction}"
            )));
        }
        let n_valid = (self.len() as f64 * fraction).round() as usize;
        let at = self.len() - n_valid;
        Ok(Dataset {
            feature_count: self.feature_count,
            features: self.features.split_off(at),
            labels: self.labels.split_off(at),
        })
    }

    /// バッチを取得
    pub fn get_batch(&self, start: usize, batch_size: usize) -> DatasetBatch<'_> {
        let end = (start + batch_size).min(self.len());
        let start = start.min(end);
        DatasetBatch {
            features: &self.features[start..end],
            labels: &self.labels[start..end],
        }
    }

    /// エポックのイテレータ
    pub fn batches(&self, batch_size: usize) -> impl Iterator<Item = DatasetBatch<'_>> + '_ {
        let step = batch_size.max(1);
        (0..self.len()).step_by(step).map(move |start| self.get_batch(start, step))
    }

    /// ラベルの平均値
    pub fn mean_label(&self) -> Option<f32> {
        if self.is_empty() {
            return None;
        }
        let sum: f64 = self.labels.iter().map(|&y| f64::from(y)).sum();
        Some((sum / self.len() as f64) as f32)
    }
}
