//! statedb ツール群
//!
//! - `common`: CLI 引数・入出力・進捗表示の共通処理
//! - `collect`: 入力ファイルからデータセットを作る
//! - `export`: データセットの書き出し（jsonl / f32le）
//! - `baseline`: 線形ベースラインの学習

pub mod baseline;
pub mod collect;
pub mod common;
pub mod export;
