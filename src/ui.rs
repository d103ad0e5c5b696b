use crate::errors::{AppError, AppResult};
use indicatif::{ProgressBar, ProgressStyle};

/// Creates a progress bar with the standard application styling.
///
/// Returns a hidden bar when `hidden` is set, so callers can drive it the same
/// way whether or not progress output is enabled.
///
/// # Example
///
/// ```no_run
/// use licitpy::ui;
///
/// # fn main() -> Result<(), licitpy::errors::AppError> {
/// let pb = ui::create_progress_bar(100, false)?;
/// pb.inc(1);
/// pb.finish_with_message("Done");
/// # Ok(())
/// # }
/// ```
pub fn create_progress_bar(total: u64, hidden: bool) -> AppResult<ProgressBar> {
    styled_bar(total, hidden, COUNT_TEMPLATE)
}

/// Byte-oriented bar for single file downloads.
pub fn create_download_bar(total_bytes: u64, file_name: &str, hidden: bool) -> AppResult<ProgressBar> {
    let pb = styled_bar(total_bytes, hidden, BYTES_TEMPLATE)?;
    pb.set_message(format!("Downloading {file_name}"));
    Ok(pb)
}

const COUNT_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}";
const BYTES_TEMPLATE: &str = "{msg} [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})";

fn styled_bar(total: u64, hidden: bool, template: &str) -> AppResult<ProgressBar> {
    if hidden {
        return Ok(ProgressBar::hidden());
    }

    let style = ProgressStyle::default_bar()
        .template(template)
        .map_err(|e| AppError::IoError(format!("Invalid progress bar template: {e}")))?
        .progress_chars("#>-");
    Ok(ProgressBar::new(total).with_style(style))
}
