//! Progress indicators for the hearth CLI.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner for a blocking fan-out; hidden when `quiet`
pub fn spinner(msg: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} ({elapsed})")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Stop and erase the spinner before printing results
pub fn finish_clear(pb: &ProgressBar) {
    pb.finish_and_clear();
}
