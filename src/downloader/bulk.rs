use super::http::HttpClient;
use crate::constants::{
    CSV_CODE_COLUMN, CSV_PUBLICATION_DATE_COLUMN, CSV_REGION_COLUMN, CSV_STATUS_COLUMN,
};
use crate::errors::{AppError, AppResult};
use crate::models::{Region, Status};
use crate::utils::buffer_capacity;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

const CSV_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];
const CSV_DATE_FORMAT: &str = "%Y-%m-%d";

/// One tender of the monthly bulk export, after deduplication.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkTender {
    pub code: String,
    pub published_on: NaiveDate,
    pub region: Option<Region>,
    pub status: Option<Status>,
}

/// The export is named without zero padding (`2024-3.zip`).
pub fn bulk_csv_url(base_url: &str, year: i32, month: u32) -> String {
    format!("{base_url}/lic-da/{year}-{month}.zip")
}

/// Downloads the monthly export into a temp file and reads its tenders.
///
/// The archive can be hundreds of megabytes, so it is streamed to disk rather
/// than buffered, and parsed on the blocking pool.
pub async fn fetch_month_tenders(
    http: &HttpClient,
    base_url: &str,
    year: i32,
    month: u32,
) -> AppResult<Vec<BulkTender>> {
    let url = bulk_csv_url(base_url, year, month);
    info!(url = %url, "Downloading bulk tender export");

    let archive = NamedTempFile::new()?;
    let mut file = tokio::fs::File::from_std(archive.reopen()?);
    let mut response = http.client().get(&url).send().await?.error_for_status()?;

    let mut written = 0usize;
    while let Some(chunk) = response.chunk().await? {
        written += chunk.len();
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    drop(file);
    debug!(url = %url, bytes = written, "Bulk export downloaded");

    let tenders = tokio::task::spawn_blocking(move || read_bulk_zip(archive.path())).await??;
    info!(year, month, tenders = tenders.len(), "Parsed bulk tender export");
    Ok(tenders)
}

/// Reads the first member of the archive as a latin-1, `;` separated CSV.
pub fn read_bulk_zip(path: &Path) -> AppResult<Vec<BulkTender>> {
    let mut archive = zip::ZipArchive::new(File::open(path)?)?;
    if archive.len() == 0 {
        return Err(AppError::ParseError("ZIP: bulk export archive is empty".into()));
    }

    let mut member = archive.by_index(0)?;
    let mut raw = Vec::with_capacity(buffer_capacity(member.size()));
    member.read_to_end(&mut raw)?;

    parse_bulk_csv(&raw)
}

/// Parses the export, keeping one row per code.
///
/// # Errors
///
/// Fails when the code column is missing, the export has no rows, a date is
/// malformed, or one code appears with two publication days.
pub fn parse_bulk_csv(raw: &[u8]) -> AppResult<Vec<BulkTender>> {
    // Latin-1 maps every byte to the code point of the same value.
    let text: String = raw.iter().map(|&byte| char::from(byte)).collect();

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|header| header.trim() == name);
    let code_column = column(CSV_CODE_COLUMN).ok_or_else(|| {
        AppError::ParseError(format!("CSV: column '{CSV_CODE_COLUMN}' not found"))
    })?;
    let date_column = column(CSV_PUBLICATION_DATE_COLUMN).ok_or_else(|| {
        AppError::ParseError(format!("CSV: column '{CSV_PUBLICATION_DATE_COLUMN}' not found"))
    })?;
    let region_column = column(CSV_REGION_COLUMN);
    let status_column = column(CSV_STATUS_COLUMN);

    let mut tenders: Vec<BulkTender> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut rows = 0usize;

    for record in reader.records() {
        let record = record?;
        rows += 1;

        let code = record.get(code_column).unwrap_or_default().trim();
        if code.is_empty() {
            continue;
        }
        let published_on = parse_csv_date(record.get(date_column).unwrap_or_default())?;

        if let Some(&index) = seen.get(code) {
            if tenders[index].published_on != published_on {
                return Err(AppError::ValueFormat(format!(
                    "Inconsistent publication dates for tender {code}: {} and {published_on}",
                    tenders[index].published_on
                )));
            }
            continue;
        }

        let cell = |column: Option<usize>| column.and_then(|index| record.get(index));
        seen.insert(code.to_string(), tenders.len());
        tenders.push(BulkTender {
            code: code.to_string(),
            published_on,
            region: cell(region_column).and_then(|name| Region::from_name(name).ok()),
            status: cell(status_column).and_then(|label| Status::from_csv(label).ok()),
        });
    }

    if rows == 0 {
        return Err(AppError::ParseError("No data found in the CSV file".into()));
    }

    Ok(tenders)
}

fn parse_csv_date(text: &str) -> AppResult<NaiveDate> {
    let trimmed = text.trim();
    CSV_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|datetime| datetime.date())
        .or_else(|| NaiveDate::parse_from_str(trimmed, CSV_DATE_FORMAT).ok())
        .ok_or_else(|| AppError::ValueFormat(format!("Invalid publication date in CSV: '{trimmed}'")))
}
