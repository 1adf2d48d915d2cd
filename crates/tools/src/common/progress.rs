//! indicatif 進捗バー

use indicatif::{ProgressBar, ProgressStyle};

const BAR_TEMPLATE: &str = "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({per_sec}) {msg}";
const SPINNER_TEMPLATE: &str = "[{elapsed_precise}] {spinner} {pos} records ({per_sec}) {msg}";

/// レコード数が分かれば通常のバー、分からなければスピナー
pub fn record_progress(total: Option<u64>, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let (pb, template) = match total {
        Some(n) => (ProgressBar::new(n), BAR_TEMPLATE),
        None => (ProgressBar::new_spinner(), SPINNER_TEMPLATE),
    };
    let style = ProgressStyle::default_bar()
        .template(template)
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}
