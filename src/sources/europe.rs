use super::TenderAdapter;
use crate::config::{Endpoints, Settings};
use crate::downloader::{self, HttpClient, MonthlyPackage, PackageDownload, RetryConfig};
use crate::errors::AppResult;
use crate::models::Country;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::PathBuf;

/// TED: notice pages, daily search and monthly bulk packages.
#[derive(Debug, Clone)]
pub struct EuropeAdapter {
    http: HttpClient,
    endpoints: Endpoints,
    packages: PackageDownload,
}

impl EuropeAdapter {
    pub fn new(http: HttpClient, settings: &Settings, endpoints: Endpoints) -> Self {
        let packages = PackageDownload {
            base_url: endpoints.ted.clone(),
            download_dir: settings.download_dir.clone(),
            concurrency: settings.concurrency,
            retry: RetryConfig::from_settings(settings),
            hide_progress: settings.disable_progress_bar,
        };
        Self {
            http,
            endpoints,
            packages,
        }
    }
}

#[async_trait]
impl TenderAdapter for EuropeAdapter {
    fn country(&self) -> Country {
        Country::EU
    }

    async fn url(&self, code: &str) -> AppResult<String> {
        Ok(downloader::ted::notice_url(&self.endpoints.ted, code))
    }

    async fn html(&self, url: &str) -> AppResult<String> {
        self.http.get_text(url).await
    }

    async fn codes_published_on(&self, date: NaiveDate) -> AppResult<Vec<String>> {
        let mut codes = downloader::ted::notice_codes(&self.http, &self.endpoints.ted_api, date).await?;
        codes.sort();
        codes.dedup();
        Ok(codes)
    }

    async fn download_packages(&self, packages: &[MonthlyPackage]) -> AppResult<Vec<PathBuf>> {
        downloader::download_packages(&self.http, packages, &self.packages).await
    }
}
