//! ストリームからのレコード逐次読み込み

use std::io::{ErrorKind, Read};

use crate::error::{Result, StateDbError};
use crate::record::{RawRecord, RecordLayout};

/// 固定長レコードを1件ずつ復号するイテレータ
///
/// レコード境界で0バイトならば正常終了、1バイト以上レコード長未満ならば
/// `TruncatedStream` を返す。エラーを返した後は `None` しか返さない。
pub struct RecordReader<R> {
    inner: R,
    layout: RecordLayout,
    buf: Vec<u8>,
    index: u64,
    done: bool,
}

impl<R: Read> RecordReader<R> {
    pub fn new(inner: R, layout: RecordLayout) -> Self {
        Self {
            inner,
            layout,
            buf: vec![0u8; layout.size()],
            index: 0,
            done: false,
        }
    }

    /// これまでに復号したレコード数
    pub fn records_read(&self) -> u64 {
        self.index
    }

    /// 次のレコードを読む。ストリーム終端では `Ok(None)`
    pub fn read_record(&mut self) -> Result<Option<RawRecord>> {
        if self.done {
            return Ok(None);
        }
        let result = self.read_record_inner();
        if !matches!(result, Ok(Some(_))) {
            self.done = true;
        }
        result
    }

    fn read_record_inner(&mut self) -> Result<Option<RawRecord>> {
        let got = fill_buf(&mut self.inner, &mut self.buf)?;
        if got == 0 {
            return Ok(None);
        }
        if got < self.buf.len() {
            return Err(StateDbError::TruncatedStream {
                index: self.index,
                got,
                expected: self.buf.len(),
            });
        }
        let record = RawRecord::decode(&self.buf, self.layout, self.index)?;
        self.index += 1;
        Ok(Some(record))
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record().transpose()
    }
}

/// `buf` が埋まるか EOF に達するまで読む。読めたバイト数を返す
fn fill_buf<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn records() -> Vec<RawRecord> {
        vec![
            RawRecord::new(false, false, 1, 10.0, [1, 2, 3]),
            RawRecord::new(true, false, 2, 100.0, [4, 5, 6]),
            RawRecord::new(false, true, 3, 0.0, [7, 8, 9]),
        ]
    }

    fn encode_all(recs: &[RawRecord], layout: RecordLayout) -> Vec<u8> {
        recs.iter().flat_map(|r| r.encode(layout)).collect()
    }

    /// 1バイトずつしか返さないリーダ
    struct Trickle(Cursor<Vec<u8>>);

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = buf.len().min(1);
            self.0.read(&mut buf[..n])
        }
    }

    #[test]
    fn test_reads_all_records_in_order() {
        let recs = records();
        let bytes = encode_all(&recs, RecordLayout::Compact);
        let reader = RecordReader::new(Cursor::new(bytes), RecordLayout::Compact);
        let decoded: Vec<RawRecord> = reader.collect::<Result<_>>().unwrap();
        assert_eq!(decoded, recs);
    }

    #[test]
    fn test_empty_stream_yields_nothing() {
        let mut reader = RecordReader::new(Cursor::new(Vec::new()), RecordLayout::Wide);
        assert!(reader.next().is_none());
        assert_eq!(reader.records_read(), 0);
    }

    #[test]
    fn test_short_reads_are_reassembled() {
        let recs = records();
        let bytes = encode_all(&recs, RecordLayout::Wide);
        let reader = RecordReader::new(Trickle(Cursor::new(bytes)), RecordLayout::Wide);
        assert_eq!(reader.count(), 3);
    }

    #[test]
    fn test_trailing_partial_record_is_error() {
        let recs = records();
        let mut bytes = encode_all(&recs, RecordLayout::Compact);
        bytes.extend_from_slice(&[0u8; 17]);
        let mut reader = RecordReader::new(Cursor::new(bytes), RecordLayout::Compact);
        for _ in 0..3 {
            assert!(reader.next().unwrap().is_ok());
        }
        match reader.next() {
            Some(Err(StateDbError::TruncatedStream { index, got, expected })) => {
                assert_eq!(index, 3);
                assert_eq!(got, 17);
                assert_eq!(expected, 42);
            }
            other => panic!("expected TruncatedStream, got {other:?}"),
        }
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_stops_after_malformed_record() {
        let mut recs = records();
        recs[1].state_size = 5;
        let bytes = encode_all(&recs, RecordLayout::Compact);
        let mut reader = RecordReader::new(Cursor::new(bytes), RecordLayout::Compact);
        assert!(reader.next().unwrap().is_ok());
        assert!(matches!(
            reader.next(),
            Some(Err(StateDbError::MalformedRecord { index: 1, state_size: 5 }))
        ));
        assert!(reader.next().is_none());
    }
}
