//! パック済み状態ビット列から特徴量ベクトルへの展開
//!
//! | 区間               | ビット数       | 内容                          |
//! |--------------------|----------------|-------------------------------|
//! | state[0]           | 64 - skip      | 黒ポーン（下位 skip ビットは擬似プロパティ） |
//! | state[1]           | 64             | 白ポーン                      |
//! | state[2]           | 7              | 手番などの制御プロパティ      |
//!
//! 各ワードのビット k は `(value >> k) & 1` として k の昇順（LSB 先頭）で並べる。
//! この順序がベクトルの添字と盤面マスの対応を決めるので変更してはならない。

use crate::error::{Result, StateDbError};
use crate::record::STATE_WORDS;

const WORD_BITS: u32 = 64;

/// state[2] から取り出すビット数
pub const CONTROL_BITS: u32 = 7;

/// state[2] の許容最大値
pub const MAX_CONTROL_VALUE: u64 = (1 << CONTROL_BITS) - 1;

/// 擬似プロパティ数の既定値
pub const DEFAULT_PSEUDO_PROP_SKIP: u32 = 5;

/// 特徴量展開の設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureLayout {
    pseudo_prop_skip: u32,
}

impl FeatureLayout {
    /// `pseudo_prop_skip` は 0..=64
    pub fn new(pseudo_prop_skip: u32) -> Result<Self> {
        if pseudo_prop_skip > WORD_BITS {
            return Err(StateDbError::InvalidConfig(format!(
                "pseudo_prop_skip must be at most {WORD_BITS}, got {pseudo_prop_skip}"
            )));
        }
        Ok(Self { pseudo_prop_skip })
    }

    pub fn pseudo_prop_skip(&self) -> u32 {
        self.pseudo_prop_skip
    }

    /// 特徴量ベクトルの長さ
    pub fn feature_count(&self) -> usize {
        ((WORD_BITS - self.pseudo_prop_skip) + WORD_BITS + CONTROL_BITS) as usize
    }

    /// 状態を展開して `out` の末尾に追加する
    ///
    /// 検証に失敗した場合 `out` は変更しない。
    pub fn expand_into(&self, state: &[u64; STATE_WORDS], index: u64, out: &mut Vec<f32>) -> Result<()> {
        if state[2] > MAX_CONTROL_VALUE {
            return Err(StateDbError::InvalidState {
                index,
                value: state[2],
            });
        }
        out.reserve(self.feature_count());
        push_bits(out, state[0], self.pseudo_prop_skip, WORD_BITS);
        push_bits(out, state[1], 0, WORD_BITS);
        push_bits(out, state[2], 0, CONTROL_BITS);
        Ok(())
    }

    /// 状態とスコアから (特徴量, ラベル) を作る
    pub fn expand(&self, state: &[u64; STATE_WORDS], score: f64, index: u64) -> Result<(Vec<f32>, f32)> {
        let mut features = Vec::with_capacity(self.feature_count());
        self.expand_into(state, index, &mut features)?;
        Ok((features, label_for_score(score)))
    }
}

impl Default for FeatureLayout {
    fn default() -> Self {
        Self {
            pseudo_prop_skip: DEFAULT_PSEUDO_PROP_SKIP,
        }
    }
}

/// 学習ラベル。勝ちの終局/確定状態では 1.0 を超えうる
#[inline]
pub fn label_for_score(score: f64) -> f32 {
    (score / 100.0) as f32
}

#[inline]
fn push_bits(out: &mut Vec<f32>, value: u64, from: u32, to: u32) {
    for k in from..to {
        out.push(((value >> k) & 1) as f32);
    }
}
