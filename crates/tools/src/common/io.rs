//! ファイルI/Oユーティリティ（gzip対応）
//!
//! パス `-` は標準入出力を表す。拡張子 `.gz` は透過的に伸長・圧縮する。

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

const READER_BUF_CAP: usize = 1024 * 1024; // 1 MiB

fn is_stdio(p: &Path) -> bool {
    p.to_string_lossy() == "-"
}

fn is_gz(p: &Path) -> bool {
    p.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"))
}

/// 入力を開く（`.gz` は伸長する）
pub fn open_input<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn Read>> {
    let p = path.as_ref();
    if is_stdio(p) {
        return Ok(Box::new(BufReader::with_capacity(READER_BUF_CAP, io::stdin())));
    }
    let f = File::open(p)?;
    if is_gz(p) {
        let dec = flate2::read::GzDecoder::new(BufReader::with_capacity(READER_BUF_CAP, f));
        return Ok(Box::new(dec));
    }
    Ok(Box::new(BufReader::with_capacity(READER_BUF_CAP, f)))
}

/// 非圧縮ファイルならそのバイト数（進捗表示用）
pub fn input_len_hint<P: AsRef<Path>>(path: P) -> Option<u64> {
    let p = path.as_ref();
    if is_stdio(p) || is_gz(p) {
        return None;
    }
    std::fs::metadata(p).ok().map(|m| m.len())
}

/// 入力全体をメモリに読み込む（並列パス用）
pub fn read_input<P: AsRef<Path>>(path: P) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(input_len_hint(path.as_ref()).unwrap_or(0) as usize);
    open_input(path)?.read_to_end(&mut buf)?;
    Ok(buf)
}

/// Output wrapper to propagate finish/close errors for compressed outputs.
#[must_use = "call .close() to propagate compression/IO errors"]
pub enum Output {
    Plain(BufWriter<File>),
    Stdout(BufWriter<io::Stdout>),
    Gz(flate2::write::GzEncoder<BufWriter<File>>),
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Plain(f) => f.write(buf),
            Output::Stdout(s) => s.write(buf),
            Output::Gz(e) => e.write(buf),
        }
    }
    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Plain(f) => f.flush(),
            Output::Stdout(s) => s.flush(),
            Output::Gz(e) => e.flush(),
        }
    }
}

impl Output {
    /// Finalize the stream and flush the underlying file/stdout.
    pub fn close(self) -> io::Result<()> {
        match self {
            Output::Plain(f) => {
                let mut file = f.into_inner().map_err(|e| e.into_error())?;
                file.flush()
            }
            Output::Stdout(mut s) => s.flush(),
            Output::Gz(e) => {
                let mut w = e.finish()?;
                w.flush()
            }
        }
    }
}

/// 出力を作成する（`.gz` は圧縮する）
pub fn create_output<P: AsRef<Path>>(path: P) -> io::Result<Output> {
    let p = path.as_ref();
    if is_stdio(p) {
        return Ok(Output::Stdout(BufWriter::new(io::stdout())));
    }
    let f = BufWriter::new(File::create(p)?);
    if is_gz(p) {
        let enc = flate2::write::GzEncoder::new(f, flate2::Compression::default());
        return Ok(Output::Gz(enc));
    }
    Ok(Output::Plain(f))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gz_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin.gz");
        let payload: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();

        let mut out = create_output(&path).unwrap();
        out.write_all(&payload).unwrap();
        out.close().unwrap();

        assert_eq!(input_len_hint(&path), None);
        assert_eq!(read_input(&path).unwrap(), payload);
    }

    #[test]
    fn test_plain_file_has_len_hint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("states.db");
        let mut out = create_output(&path).unwrap();
        out.write_all(&[7u8; 84]).unwrap();
        out.close().unwrap();

        assert_eq!(input_len_hint(&path), Some(84));
        assert_eq!(read_input(&path).unwrap().len(), 84);
    }
}
