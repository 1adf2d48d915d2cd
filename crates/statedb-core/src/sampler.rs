//! バケット別の確率サンプリング
//!
//! 終局・確定状態は推定状態に比べて桁違いに多いため、バケットごとに採用確率を
//! 設定して学習データ中の比率を揃える。

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::bucket::Bucket;
use crate::error::{Result, StateDbError};

/// 採用確率の既定セット
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SamplingPreset {
    /// 終局/確定バケットを間引き、推定は全件採用
    #[default]
    Stratified,
    /// 全バケット全件採用
    All,
    /// 推定のみ採用（終局/確定は件数だけ数える）
    EstimatesOnly,
}

impl SamplingPreset {
    pub fn as_str(self) -> &'static str {
        match self {
            SamplingPreset::Stratified => "stratified",
            SamplingPreset::All => "all",
            SamplingPreset::EstimatesOnly => "estimates-only",
        }
    }
}

impl fmt::Display for SamplingPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SamplingPreset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stratified" => Ok(SamplingPreset::Stratified),
            "all" => Ok(SamplingPreset::All),
            "estimates-only" | "estimates_only" => Ok(SamplingPreset::EstimatesOnly),
            other => Err(format!(
                "unknown sampling preset '{other}' (expected stratified|all|estimates-only)"
            )),
        }
    }
}

/// バケットごとの採用確率
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeepProbabilities {
    pub terminal_win: f64,
    pub terminal_loss: f64,
    pub complete_win: f64,
    pub complete_loss: f64,
    pub estimate: f64,
}

impl KeepProbabilities {
    /// 全バケットに同じ確率を設定
    pub const fn uniform(p: f64) -> Self {
        Self {
            terminal_win: p,
            terminal_loss: p,
            complete_win: p,
            complete_loss: p,
            estimate: p,
        }
    }

    pub const fn from_preset(preset: SamplingPreset) -> Self {
        match preset {
            SamplingPreset::Stratified => Self {
                terminal_win: 1.0 / 500.0,
                terminal_loss: 1.0 / 170.0,
                complete_win: 1.0 / 250.0,
                complete_loss: 1.0 / 90.0,
                estimate: 1.0,
            },
            SamplingPreset::All => Self::uniform(1.0),
            SamplingPreset::EstimatesOnly => Self {
                estimate: 1.0,
                ..Self::uniform(0.0)
            },
        }
    }

    pub fn get(&self, bucket: Bucket) -> f64 {
        match bucket {
            Bucket::TerminalWin => self.terminal_win,
            Bucket::TerminalLoss => self.terminal_loss,
            Bucket::CompleteWin => self.complete_win,
            Bucket::CompleteLoss => self.complete_loss,
            Bucket::Estimate => self.estimate,
        }
    }

    pub fn set(&mut self, bucket: Bucket, p: f64) {
        let slot = match bucket {
            Bucket::TerminalWin => &mut self.terminal_win,
            Bucket::TerminalLoss => &mut self.terminal_loss,
            Bucket::CompleteWin => &mut self.complete_win,
            Bucket::CompleteLoss => &mut self.complete_loss,
            Bucket::Estimate => &mut self.estimate,
        };
        *slot = p;
    }

    /// 全確率が有限かつ [0, 1] に収まっているか検査
    pub fn validate(&self) -> Result<()> {
        for bucket in Bucket::ALL {
            let value = self.get(bucket);
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(StateDbError::InvalidProbability { bucket, value });
            }
        }
        Ok(())
    }
}

impl Default for KeepProbabilities {
    fn default() -> Self {
        Self::from_preset(SamplingPreset::default())
    }
}

/// 注入された乱数源で採否を決めるサンプラ
pub struct Sampler<R> {
    probs: KeepProbabilities,
    rng: R,
}

impl<R: Rng> Sampler<R> {
    pub fn new(probs: KeepProbabilities, rng: R) -> Result<Self> {
        probs.validate()?;
        Ok(Self { probs, rng })
    }

    /// 一様乱数を1回引き、`draw < p(bucket)` ならば採用
    pub fn keep(&mut self, bucket: Bucket) -> bool {
        let draw: f64 = self.rng.random();
        draw < self.probs.get(bucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_terminal_win_rate_matches_expectation() {
        let mut sampler = Sampler::new(
            KeepProbabilities::from_preset(SamplingPreset::Stratified),
            ChaCha8Rng::seed_from_u64(42),
        )
        .unwrap();

        const TRIALS: usize = 100_000;
        let kept = (0..TRIALS).filter(|_| sampler.keep(Bucket::TerminalWin)).count();

        // 期待値 200, 標準偏差 ≈ 14.1。5σ を許容幅とする
        let p = 1.0 / 500.0;
        let mean = TRIALS as f64 * p;
        let sigma = (TRIALS as f64 * p * (1.0 - p)).sqrt();
        assert!(
            (kept as f64 - mean).abs() < 5.0 * sigma,
            "kept {kept}, expected about {mean}"
        );
    }

    #[test]
    fn test_probability_one_always_keeps() {
        let mut sampler =
            Sampler::new(KeepProbabilities::uniform(1.0), ChaCha8Rng::seed_from_u64(1)).unwrap();
        assert!((0..10_000).all(|_| sampler.keep(Bucket::Estimate)));
    }

    #[test]
    fn test_probability_zero_never_keeps() {
        let mut sampler = Sampler::new(
            KeepProbabilities::from_preset(SamplingPreset::EstimatesOnly),
            ChaCha8Rng::seed_from_u64(1),
        )
        .unwrap();
        assert!((0..10_000).all(|_| !sampler.keep(Bucket::CompleteLoss)));
        assert!(sampler.keep(Bucket::Estimate));
    }

    #[test]
    fn test_same_seed_same_decisions() {
        let probs = KeepProbabilities::uniform(0.3);
        let mut a = Sampler::new(probs, ChaCha8Rng::seed_from_u64(7)).unwrap();
        let mut b = Sampler::new(probs, ChaCha8Rng::seed_from_u64(7)).unwrap();
        let da: Vec<bool> = (0..1000).map(|_| a.keep(Bucket::Estimate)).collect();
        let db: Vec<bool> = (0..1000).map(|_| b.keep(Bucket::Estimate)).collect();
        assert_eq!(da, db);
    }

    #[test]
    fn test_out_of_range_probability_rejected() {
        let mut probs = KeepProbabilities::uniform(1.0);
        probs.set(Bucket::CompleteWin, 1.5);
        assert!(matches!(
            probs.validate(),
            Err(StateDbError::InvalidProbability { bucket: Bucket::CompleteWin, .. })
        ));

        probs.set(Bucket::CompleteWin, f64::NAN);
        assert!(Sampler::new(probs, ChaCha8Rng::seed_from_u64(0)).is_err());
    }

    #[test]
    fn test_stratified_defaults() {
        let p = KeepProbabilities::default();
        assert_eq!(p.terminal_win, 1.0 / 500.0);
        assert_eq!(p.terminal_loss, 1.0 / 170.0);
        assert_eq!(p.complete_win, 1.0 / 250.0);
        assert_eq!(p.complete_loss, 1.0 / 90.0);
        assert_eq!(p.estimate, 1.0);
    }
}
