//! 線形ベースライン（シグモイド出力、サンプル毎 SGD、MSE 損失）
//!
//! ネットワーク構成や最適化の調整は対象外。学習データが学習可能な信号を
//! 含むかを確かめるための最小限のモデル。

use rand::Rng;
use rand::seq::SliceRandom;

use statedb_core::Dataset;

#[derive(Debug, Clone, Copy)]
pub struct BaselineConfig {
    pub epochs: usize,
    pub lr: f32,
    pub l2: f32,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            epochs: 3,
            lr: 0.05,
            l2: 1e-6,
        }
    }
}

/// `sigmoid(w・x + b)`
#[derive(Debug, Clone)]
pub struct LinearBaseline {
    weights: Vec<f32>,
    bias: f32,
}

fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}

impl LinearBaseline {
    pub fn new(feature_count: usize) -> Self {
        Self {
            weights: vec![0.0; feature_count],
            bias: 0.0,
        }
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn bias(&self) -> f32 {
        self.bias
    }

    pub fn predict(&self, features: &[f32]) -> f32 {
        let z: f32 = self
            .weights
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f32>()
            + self.bias;
        sigmoid(z)
    }

    pub fn predict_all(&self, dataset: &Dataset) -> Vec<f32> {
        dataset.features().iter().map(|x| self.predict(x)).collect()
    }

    /// 1エポック分の SGD。そのエポック中の平均二乗誤差を返す
    ///
    /// サンプル順は毎エポック `rng` でシャッフルする。
    pub fn train_epoch<R: Rng>(&mut self, dataset: &Dataset, cfg: &BaselineConfig, rng: &mut R) -> f64 {
        if dataset.is_empty() {
            return 0.0;
        }
        let mut order: Vec<usize> = (0..dataset.len()).collect();
        order.shuffle(rng);

        let features = dataset.features();
        let labels = dataset.labels();
        let mut sum_sq = 0f64;
        for &i in &order {
            let x = &features[i];
            let y = labels[i];
            let p = self.predict(x);
            let err = p - y;
            sum_sq += f64::from(err * err);

            // d/dz (p - y)^2 / 2 = (p - y) * p * (1 - p)
            let g = err * p * (1.0 - p);
            for (w, &xj) in self.weights.iter_mut().zip(x) {
                *w -= cfg.lr * (g * xj + cfg.l2 * *w);
            }
            self.bias -= cfg.lr * g;
        }
        sum_sq / dataset.len() as f64
    }

    /// `cfg.epochs` 回学習し、エポックごとの MSE を返す
    pub fn fit<R: Rng>(&mut self, dataset: &Dataset, cfg: &BaselineConfig, rng: &mut R) -> Vec<f64> {
        (0..cfg.epochs)
            .map(|ep| {
                let mse = self.train_epoch(dataset, cfg, rng);
                log::info!("epoch {}: MSE={:.6}", ep + 1, mse);
                mse
            })
            .collect()
    }
}
