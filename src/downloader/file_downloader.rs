use super::http::HttpClient;
use super::retry::{with_retry, RetryConfig};
use crate::concurrency::fan_out;
use crate::constants::TED_FIRST_BULK_YEAR;
use crate::errors::{AppError, AppResult};
use crate::ui;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// A monthly TED bulk package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonthlyPackage {
    pub year: i32,
    pub month: u32,
}

impl MonthlyPackage {
    /// Validates the period: a four digit year from 2015 on and a month in 1..=12.
    pub fn new(year: i32, month: u32) -> AppResult<Self> {
        validate_year(year)?;
        if !(1..=12).contains(&month) {
            return Err(AppError::InvalidInput(format!(
                "Invalid month: {month}. Expected a value between 1 and 12."
            )));
        }
        Ok(Self { year, month })
    }

    /// All twelve packages of a year.
    pub fn year(year: i32) -> AppResult<Vec<Self>> {
        validate_year(year)?;
        (1..=12).map(|month| Self::new(year, month)).collect()
    }

    /// `2024-03`, used for both the URL and the file name.
    pub fn period(&self) -> String {
        format!("{}-{:02}", self.year, self.month)
    }

    pub fn url(&self, base_url: &str) -> String {
        format!("{base_url}/packages/monthly/{}", self.period())
    }

    pub fn file_name(&self) -> String {
        format!("{}.tar.gz", self.period())
    }
}

fn validate_year(year: i32) -> AppResult<()> {
    if !(1000..=9999).contains(&year) {
        return Err(AppError::InvalidInput(format!(
            "Invalid year: {year}. Expected a four digit year."
        )));
    }
    if year < TED_FIRST_BULK_YEAR {
        return Err(AppError::InvalidInput(format!(
            "Invalid year: {year}. Bulk packages start in {TED_FIRST_BULK_YEAR}."
        )));
    }
    Ok(())
}

/// Downloads a single file to `file_path` through a `.part` file renamed on
/// completion, so an interrupted transfer never leaves a truncated package.
async fn download_single_file(
    http: &HttpClient,
    url: &str,
    tmp_path: &Path,
    file_path: &Path,
) -> AppResult<()> {
    let mut response = http.client().get(url).send().await?.error_for_status()?;

    let mut file = File::create(tmp_path).await.map_err(|e| {
        AppError::IoError(format!(
            "Failed to create temp file {}: {}",
            tmp_path.display(),
            e
        ))
    })?;

    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await.map_err(|e| {
            AppError::IoError(format!(
                "Failed to write to temp file {}: {}",
                tmp_path.display(),
                e
            ))
        })?;
    }
    file.flush().await?;

    // Ensure the file is closed before renaming
    drop(file);

    fs::rename(tmp_path, file_path).await.map_err(|e| {
        AppError::IoError(format!(
            "Failed to rename temp file {} to {}: {}",
            tmp_path.display(),
            file_path.display(),
            e
        ))
    })?;

    Ok(())
}

/// Options shared by every package of a download run.
#[derive(Debug, Clone)]
pub struct PackageDownload {
    pub base_url: String,
    pub download_dir: PathBuf,
    pub concurrency: usize,
    pub retry: RetryConfig,
    pub hide_progress: bool,
}

/// Downloads packages into `download_dir`, skipping files already present.
///
/// Downloads run concurrently; a failed package does not stop the others, but
/// the call fails listing every package that could not be fetched.
///
/// Returns the paths of all requested packages.
pub async fn download_packages(
    http: &HttpClient,
    packages: &[MonthlyPackage],
    options: &PackageDownload,
) -> AppResult<Vec<PathBuf>> {
    let download_dir = &options.download_dir;
    if !download_dir.exists() {
        fs::create_dir_all(download_dir)
            .await
            .map_err(|e| AppError::IoError(format!("Failed to create directory: {e}")))?;
    }

    let paths: Vec<PathBuf> = packages
        .iter()
        .map(|package| download_dir.join(package.file_name()))
        .collect();

    let pending: Vec<MonthlyPackage> = packages
        .iter()
        .copied()
        .filter(|package| !download_dir.join(package.file_name()).exists())
        .collect();
    let skipped_count = packages.len() - pending.len();

    if pending.is_empty() {
        info!(
            count = packages.len(),
            "All packages already exist, skipping downloads"
        );
        return Ok(paths);
    }

    info!(
        total = pending.len(),
        skipped = skipped_count,
        "Starting download"
    );

    let pb = ui::create_progress_bar(pending.len() as u64, options.hide_progress)?;
    let client = http.clone();
    let task_options = options.clone();

    let results = fan_out(
        pending.clone(),
        options.concurrency,
        Some(pb),
        move |package: MonthlyPackage| {
            let http = client.clone();
            let options = task_options.clone();
            async move {
                let url = package.url(&options.base_url);
                let file_path = options.download_dir.join(package.file_name());
                let tmp_path = options
                    .download_dir
                    .join(format!("{}.part", package.file_name()));

                // Remove stale tmp file if present (best-effort)
                if tmp_path.exists() {
                    if let Err(e) = fs::remove_file(&tmp_path).await {
                        warn!(
                            file_path = %tmp_path.display(),
                            error = %e,
                            "Failed to remove stale temp file"
                        );
                    }
                }

                with_retry(&options.retry, &url, || {
                    download_single_file(&http, &url, &tmp_path, &file_path)
                })
                .await
            }
        },
    )
    .await;

    let errors: Vec<String> = pending
        .iter()
        .zip(results)
        .filter_map(|(package, result)| {
            result.err().map(|e| {
                warn!(period = %package.period(), error = %e, "Failed to download package");
                format!("{}: {e}", package.period())
            })
        })
        .collect();

    info!(
        downloaded = pending.len() - errors.len(),
        failed = errors.len(),
        skipped = skipped_count,
        "Download completed"
    );

    if skipped_count > 0 {
        debug!(skipped = skipped_count, "Skipped existing files");
    }

    if !errors.is_empty() {
        return Err(AppError::NetworkError(format!(
            "Failed to download {} package(s): {}",
            errors.len(),
            errors.join("; ")
        )));
    }

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_period_and_url() {
        let package = MonthlyPackage::new(2024, 3).unwrap();
        assert_eq!(package.period(), "2024-03");
        assert_eq!(
            package.url("https://ted.europa.eu"),
            "https://ted.europa.eu/packages/monthly/2024-03"
        );
        assert_eq!(package.file_name(), "2024-03.tar.gz");
    }

    #[test]
    fn test_year_validation() {
        assert_eq!(MonthlyPackage::year(2015).unwrap().len(), 12);
        assert!(MonthlyPackage::year(2014).is_err());
        assert!(MonthlyPackage::year(24).is_err());
        assert!(MonthlyPackage::year(20245).is_err());
        assert!(MonthlyPackage::new(2024, 13).is_err());
        assert!(MonthlyPackage::new(2024, 0).is_err());
    }

    #[tokio::test]
    async fn test_existing_packages_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let package = MonthlyPackage::new(2024, 1).unwrap();
        std::fs::write(dir.path().join(package.file_name()), b"done").unwrap();

        let http = HttpClient::with_cache(&crate::config::Settings::default(), None).unwrap();
        let options = PackageDownload {
            base_url: "http://127.0.0.1:9".into(),
            download_dir: dir.path().to_path_buf(),
            concurrency: 2,
            retry: RetryConfig::default(),
            hide_progress: true,
        };

        let paths = download_packages(&http, &[package], &options).await.unwrap();
        assert_eq!(paths, vec![dir.path().join("2024-01.tar.gz")]);
    }
}
