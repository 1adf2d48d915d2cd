//! 探索状態レコードの復号
//!
//! 探索エンジンが書き出す `states.db` は固定長・ビッグエンディアンのレコードを
//! ヘッダ・フッタ無しで並べただけのファイルで、件数はファイル長から決まる。
//!
//! # データ形式
//!
//! ## compact (42バイト/レコード, 既定)
//!
//! | オフセット | サイズ | 型      | フィールド  |
//! |------------|--------|---------|-------------|
//! | 0          | 1      | bool    | terminal    |
//! | 1          | 1      | bool    | complete    |
//! | 2          | 4      | i32     | visits      |
//! | 6          | 8      | f64     | score       |
//! | 14         | 4      | i32     | state_size  |
//! | 18         | 8      | u64     | state[0]    |
//! | 26         | 8      | u64     | state[1]    |
//! | 34         | 8      | u64     | state[2]    |
//!
//! ## wide (46バイト/レコード)
//!
//! visits が 8 バイト、state_size が符号無し 4 バイトになる以外は同じ並び。
//! パディングはどちらの形式にも存在しない。

use std::fmt;
use std::str::FromStr;

use byteorder::{BigEndian, ByteOrder};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StateDbError};

/// 状態ベクトルのワード数（state_size の期待値）
pub const STATE_WORDS: usize = 3;

/// レコードのバイト配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordLayout {
    /// `>??idi3Q` (42バイト)
    #[default]
    Compact,
    /// visits=i64, state_size=u32 (46バイト)
    Wide,
}

impl RecordLayout {
    /// 1レコードのバイト数
    pub const fn size(self) -> usize {
        match self {
            RecordLayout::Compact => 42,
            RecordLayout::Wide => 46,
        }
    }

    const fn visits_width(self) -> usize {
        match self {
            RecordLayout::Compact => 4,
            RecordLayout::Wide => 8,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecordLayout::Compact => "compact",
            RecordLayout::Wide => "wide",
        }
    }
}

impl fmt::Display for RecordLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordLayout {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" => Ok(RecordLayout::Compact),
            "wide" => Ok(RecordLayout::Wide),
            other => Err(format!("unknown record layout '{other}' (expected compact|wide)")),
        }
    }
}

/// 復号済みの探索状態レコード
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawRecord {
    /// 終局状態か
    pub terminal: bool,
    /// 探索で値が確定した（非終局）状態か
    pub complete: bool,
    /// 訪問回数（下流では未使用）
    pub visits: i64,
    /// 評価値。勝ちを示す終局/確定状態では 100 を超えることがある
    pub score: f64,
    /// 状態ベクトルのワード数（常に 3）
    pub state_size: u32,
    /// パックされた盤面ビット列
    pub state: [u64; STATE_WORDS],
}

impl RawRecord {
    /// バイト列からレコードを復号する
    ///
    /// `index` はエラーメッセージ用のレコード番号。
    pub fn decode(bytes: &[u8], layout: RecordLayout, index: u64) -> Result<Self> {
        let size = layout.size();
        if bytes.len() < size {
            return Err(StateDbError::TruncatedStream {
                index,
                got: bytes.len(),
                expected: size,
            });
        }

        let terminal = bytes[0] != 0;
        let complete = bytes[1] != 0;

        let mut off = 2;
        let visits = match layout {
            RecordLayout::Compact => i64::from(BigEndian::read_i32(&bytes[off..])),
            RecordLayout::Wide => BigEndian::read_i64(&bytes[off..]),
        };
        off += layout.visits_width();

        let score = BigEndian::read_f64(&bytes[off..]);
        off += 8;

        // compact では符号付き i32 だが、3 以外は全て不正なので u32 として読んでよい
        let state_size = BigEndian::read_u32(&bytes[off..]);
        off += 4;

        if state_size as usize != STATE_WORDS {
            return Err(StateDbError::MalformedRecord { index, state_size });
        }

        let mut state = [0u64; STATE_WORDS];
        for word in &mut state {
            *word = BigEndian::read_u64(&bytes[off..]);
            off += 8;
        }
        debug_assert_eq!(off, size);

        Ok(Self {
            terminal,
            complete,
            visits,
            score,
            state_size,
            state,
        })
    }

    /// レコードをバイト列にシリアライズする
    ///
    /// compact 形式では visits を i32 に切り詰める。
    pub fn encode(&self, layout: RecordLayout) -> Vec<u8> {
        let mut bytes = vec![0u8; layout.size()];
        bytes[0] = u8::from(self.terminal);
        bytes[1] = u8::from(self.complete);

        let mut off = 2;
        match layout {
            RecordLayout::Compact => BigEndian::write_i32(&mut bytes[off..], self.visits as i32),
            RecordLayout::Wide => BigEndian::write_i64(&mut bytes[off..], self.visits),
        }
        off += layout.visits_width();

        BigEndian::write_f64(&mut bytes[off..], self.score);
        off += 8;
        BigEndian::write_u32(&mut bytes[off..], self.state_size);
        off += 4;

        for &word in &self.state {
            BigEndian::write_u64(&mut bytes[off..], word);
            off += 8;
        }
        bytes
    }

    /// state_size=3 の正常なレコードを作る（テスト・フィクスチャ用）
    pub fn new(terminal: bool, complete: bool, visits: i64, score: f64, state: [u64; 3]) -> Self {
        Self {
            terminal,
            complete,
            visits,
            score,
            state_size: STATE_WORDS as u32,
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> RawRecord {
        RawRecord::new(
            true,
            false,
            123_456,
            101.25,
            [0x8000_0000_0000_0001, 0x0123_4567_89ab_cdef, 0x55],
        )
    }

    #[test]
    fn test_layout_sizes() {
        assert_eq!(RecordLayout::Compact.size(), 42);
        assert_eq!(RecordLayout::Wide.size(), 46);
    }

    #[test]
    fn test_decode_compact_known_bytes() {
        let mut bytes = vec![1u8, 0];
        bytes.extend_from_slice(&10i32.to_be_bytes());
        bytes.extend_from_slice(&55.5f64.to_be_bytes());
        bytes.extend_from_slice(&3i32.to_be_bytes());
        bytes.extend_from_slice(&1u64.to_be_bytes());
        bytes.extend_from_slice(&u64::MAX.to_be_bytes());
        bytes.extend_from_slice(&127u64.to_be_bytes());
        assert_eq!(bytes.len(), 42);

        let rec = RawRecord::decode(&bytes, RecordLayout::Compact, 0).unwrap();
        assert!(rec.terminal);
        assert!(!rec.complete);
        assert_eq!(rec.visits, 10);
        assert_eq!(rec.score.to_bits(), 55.5f64.to_bits());
        assert_eq!(rec.state_size, 3);
        assert_eq!(rec.state, [1, u64::MAX, 127]);
    }

    #[test]
    fn test_decode_wide_known_bytes() {
        let mut bytes = vec![0u8, 1];
        bytes.extend_from_slice(&(-7i64).to_be_bytes());
        bytes.extend_from_slice(&0.125f64.to_be_bytes());
        bytes.extend_from_slice(&3u32.to_be_bytes());
        bytes.extend_from_slice(&2u64.to_be_bytes());
        bytes.extend_from_slice(&4u64.to_be_bytes());
        bytes.extend_from_slice(&8u64.to_be_bytes());
        assert_eq!(bytes.len(), 46);

        let rec = RawRecord::decode(&bytes, RecordLayout::Wide, 0).unwrap();
        assert!(!rec.terminal);
        assert!(rec.complete);
        assert_eq!(rec.visits, -7);
        assert_eq!(rec.score, 0.125);
        assert_eq!(rec.state, [2, 4, 8]);
    }

    #[test]
    fn test_encode_matches_decode() {
        let rec = sample_record();
        for layout in [RecordLayout::Compact, RecordLayout::Wide] {
            let bytes = rec.encode(layout);
            assert_eq!(bytes.len(), layout.size());
            assert_eq!(RawRecord::decode(&bytes, layout, 0).unwrap(), rec);
        }
    }

    #[test]
    fn test_nonzero_bool_byte_is_true() {
        let mut bytes = sample_record().encode(RecordLayout::Compact);
        bytes[0] = 0xff;
        bytes[1] = 0x02;
        let rec = RawRecord::decode(&bytes, RecordLayout::Compact, 0).unwrap();
        assert!(rec.terminal);
        assert!(rec.complete);
    }

    #[test]
    fn test_bad_state_size_is_malformed() {
        let mut rec = sample_record();
        rec.state_size = 5;
        let bytes = rec.encode(RecordLayout::Compact);
        match RawRecord::decode(&bytes, RecordLayout::Compact, 9) {
            Err(StateDbError::MalformedRecord { index, state_size }) => {
                assert_eq!(index, 9);
                assert_eq!(state_size, 5);
            }
            other => panic!("expected MalformedRecord, got {other:?}"),
        }
    }

    #[test]
    fn test_short_buffer_is_truncated() {
        let bytes = sample_record().encode(RecordLayout::Wide);
        let err = RawRecord::decode(&bytes[..20], RecordLayout::Wide, 2).unwrap_err();
        assert!(matches!(
            err,
            StateDbError::TruncatedStream { index: 2, got: 20, expected: 46 }
        ));
    }

    #[test]
    fn test_layout_from_str() {
        assert_eq!("compact".parse::<RecordLayout>().unwrap(), RecordLayout::Compact);
        assert_eq!("WIDE".parse::<RecordLayout>().unwrap(), RecordLayout::Wide);
        assert!("packed".parse::<RecordLayout>().is_err());
    }
}
