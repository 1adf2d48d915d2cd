//! 予測誤差の統計（スコア単位）

use std::fmt;

use serde::Serialize;

use crate::error::{Result, StateDbError};

/// ラベル→スコアの倍率
const SCORE_SCALE: f64 = 100.0;

/// `|予測 - ラベル| * 100` の集計
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ErrorStats {
    pub count: usize,
    pub max: f64,
    pub mean: f64,
    pub rmse: f64,
}

impl ErrorStats {
    /// 空入力なら `Ok(None)`
    pub fn from_predictions(predictions: &[f32], labels: &[f32]) -> Result<Option<Self>> {
        if predictions.len() != labels.len() {
            return Err(StateDbError::LengthMismatch {
                predictions: predictions.len(),
                labels: labels.len(),
            });
        }
        if labels.is_empty() {
            return Ok(None);
        }

        let mut max = 0f64;
        let mut sum = 0f64;
        let mut sum_sq = 0f64;
        for (&p, &y) in predictions.iter().zip(labels) {
            let e = (f64::from(p) - f64::from(y)).abs() * SCORE_SCALE;
            max = max.max(e);
            sum += e;
            sum_sq += e * e;
        }
        let n = labels.len() as f64;
        Ok(Some(Self {
            count: labels.len(),
            max,
            mean: sum / n,
            rmse: (sum_sq / n).sqrt(),
        }))
    }

    /// 全サンプルを定数 `value` で予測した場合の誤差
    pub fn for_constant(value: f32, labels: &[f32]) -> Option<Self> {
        let predictions = vec![value; labels.len()];
        Self::from_predictions(&predictions, labels).ok().flatten()
    }
}

impl fmt::Display for ErrorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Max error: {:.2}, Mean error: {:.2}, RMSE: {:.2} (n={})",
            self.max, self.mean, self.rmse, self.count
        )
    }
}
