//! ツール共通モジュール

pub mod args;
pub mod io;
pub mod progress;
