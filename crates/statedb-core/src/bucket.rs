//! レコードのバケット分類

use std::fmt;
use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::record::RawRecord;

/// これを超えるスコアを勝ちとみなす
pub const WIN_SCORE_THRESHOLD: f64 = 99.0;

/// サンプリング用のバケット
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Bucket {
    TerminalWin,
    TerminalLoss,
    CompleteWin,
    CompleteLoss,
    Estimate,
}

impl Bucket {
    pub const ALL: [Bucket; 5] = [
        Bucket::TerminalWin,
        Bucket::TerminalLoss,
        Bucket::CompleteWin,
        Bucket::CompleteLoss,
        Bucket::Estimate,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::TerminalWin => "terminal-win",
            Bucket::TerminalLoss => "terminal-loss",
            Bucket::CompleteWin => "complete-win",
            Bucket::CompleteLoss => "complete-loss",
            Bucket::Estimate => "estimate",
        }
    }

    /// レコードを分類する
    ///
    /// terminal が complete より優先される。
    pub fn classify(record: &RawRecord) -> Self {
        let win = record.score > WIN_SCORE_THRESHOLD;
        if record.terminal {
            if win { Bucket::TerminalWin } else { Bucket::TerminalLoss }
        } else if record.complete {
            if win { Bucket::CompleteWin } else { Bucket::CompleteLoss }
        } else {
            Bucket::Estimate
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// バケットごとの件数（サンプリング前）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCounts {
    pub terminal_win: u64,
    pub terminal_loss: u64,
    pub complete_win: u64,
    pub complete_loss: u64,
    pub estimate: u64,
}

impl BucketCounts {
    pub fn record(&mut self, bucket: Bucket) {
        *self.slot_mut(bucket) += 1;
    }

    /// 分類して件数を加算し、分類結果を返す
    pub fn classify(&mut self, record: &RawRecord) -> Bucket {
        let bucket = Bucket::classify(record);
        self.record(bucket);
        bucket
    }

    pub fn get(&self, bucket: Bucket) -> u64 {
        match bucket {
            Bucket::TerminalWin => self.terminal_win,
            Bucket::TerminalLoss => self.terminal_loss,
            Bucket::CompleteWin => self.complete_win,
            Bucket::CompleteLoss => self.complete_loss,
            Bucket::Estimate => self.estimate,
        }
    }

    fn slot_mut(&mut self, bucket: Bucket) -> &mut u64 {
        match bucket {
            Bucket::TerminalWin => &mut self.terminal_win,
            Bucket::TerminalLoss => &mut self.terminal_loss,
            Bucket::CompleteWin => &mut self.complete_win,
            Bucket::CompleteLoss => &mut self.complete_loss,
            Bucket::Estimate => &mut self.estimate,
        }
    }

    pub fn terminal(&self) -> u64 {
        self.terminal_win + self.terminal_loss
    }

    pub fn complete(&self) -> u64 {
        self.complete_win + self.complete_loss
    }

    pub fn total(&self) -> u64 {
        self.terminal() + self.complete() + self.estimate
    }
}

impl AddAssign for BucketCounts {
    fn add_assign(&mut self, rhs: Self) {
        for bucket in Bucket::ALL {
            *self.slot_mut(bucket) += rhs.get(bucket);
        }
    }
}

impl fmt::Display for BucketCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Terminal: {} of which {} wins and {} losses.",
            self.terminal(),
            self.terminal_win,
            self.terminal_loss
        )?;
        writeln!(
            f,
            "Complete: {} of which {} wins and {} losses.",
            self.complete(),
            self.complete_win,
            self.complete_loss
        )?;
        write!(f, "Estimate: {}", self.estimate)
    }
}
