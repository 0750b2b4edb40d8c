//! Report persistence — timestamped text files under the output directory.
//!
//! Every `allure-triage run` writes `failed_tests_{YYYYMMDD_HHMMSS}.txt`
//! regardless of `--output` mode.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Write the report content to `{output_dir}/failed_tests_{timestamp}.txt`.
///
/// Creates the output directory if it does not exist. Returns the file path.
pub fn write_report(output_dir: &Path, content: &str) -> Result<PathBuf, std::io::Error> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(build_file_name());
    std::fs::write(&path, content)?;
    Ok(path)
}

/// `failed_tests_20260205_193000.txt`
fn build_file_name() -> String {
    format!("failed_tests_{}.txt", timestamp_compact())
}

/// `"20260205_193000"` — filesystem-safe compact timestamp.
fn timestamp_compact() -> String {
    let (y, mo, d, h, mi, s) = utc_now();
    format!("{y:04}{mo:02}{d:02}_{h:02}{mi:02}{s:02}")
}

/// Current UTC date-time from epoch. No external crate needed.
fn utc_now() -> (i32, u32, u32, u32, u32, u32) {
    let epoch_secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let days = (epoch_secs / 86400) as i64;
    let tod = epoch_secs % 86400;
    let (y, m, d) = civil_from_days(days);
    (
        y,
        m,
        d,
        (tod / 3600) as u32,
        ((tod % 3600) / 60) as u32,
        (tod % 60) as u32,
    )
}

/// Howard Hinnant's `civil_from_days` — epoch days → (year, month, day).
///
/// Reference: <https://howardhinnant.github.io/date_algorithms.html#civil_from_days>
fn civil_from_days(days: i64) -> (i32, u32, u32) {
    let z = days + 719_468;
    let era = (if z >= 0 { z } else { z - 146_096 }) / 146_097;
    let doe = (z - era * 146_097) as u32;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };
    (y as i32, m, d)
}
