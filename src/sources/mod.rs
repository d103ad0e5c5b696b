//! Per-country tender sources.
//!
//! Each portal is wrapped by a [`TenderAdapter`]. Entities and queries only talk
//! to the trait, so the same `Tender` type serves every country; operations a
//! portal does not offer fail with `UnsupportedOperation`.

mod chile;
mod europe;

pub use chile::ChileAdapter;
pub use europe::EuropeAdapter;

use crate::config::{Endpoints, Settings};
use crate::downloader::{HttpClient, MonthlyPackage};
use crate::errors::{AppError, AppResult};
use crate::models::{AttachmentInfo, Country, Item, OpenContract, Question};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

pub(crate) fn unsupported(country: Country, operation: &'static str) -> AppError {
    AppError::UnsupportedOperation {
        country: country.display_name().to_string(),
        operation,
    }
}

/// Access to one procurement portal.
///
/// Page-level helpers take the HTML of the tender page so an entity can fetch it
/// once and derive every link from it.
#[async_trait]
pub trait TenderAdapter: Send + Sync + fmt::Debug {
    fn country(&self) -> Country;

    /// Public page of the tender.
    async fn url(&self, code: &str) -> AppResult<String>;

    /// Raw HTML behind a page URL.
    async fn html(&self, url: &str) -> AppResult<String>;

    /// Codes of the tenders published on `date`, sorted.
    async fn codes_published_on(&self, date: NaiveDate) -> AppResult<Vec<String>>;

    async fn open_contract(&self, _code: &str) -> AppResult<OpenContract> {
        Err(unsupported(self.country(), "open_contract"))
    }

    fn items(&self, _tender_html: &str) -> AppResult<Vec<Item>> {
        Err(unsupported(self.country(), "items"))
    }

    fn attachment_url(&self, _tender_html: &str) -> AppResult<String> {
        Err(unsupported(self.country(), "attachment_url"))
    }

    async fn attachments(&self, _attachment_url: &str) -> AppResult<Vec<AttachmentInfo>> {
        Err(unsupported(self.country(), "attachments"))
    }

    /// Content of one attachment, base64 encoded.
    async fn attachment_content(
        &self,
        _attachment_url: &str,
        _attachment: &AttachmentInfo,
    ) -> AppResult<String> {
        Err(unsupported(self.country(), "attachment_content"))
    }

    /// Purchase order list URL, `None` when the tender has no orders.
    fn purchase_orders_url(&self, _tender_html: &str) -> AppResult<Option<String>> {
        Err(unsupported(self.country(), "purchase_orders_url"))
    }

    async fn purchase_order_codes(&self, _list_url: &str) -> AppResult<Vec<String>> {
        Err(unsupported(self.country(), "purchase_order_codes"))
    }

    fn purchase_order_url(&self, _code: &str) -> AppResult<String> {
        Err(unsupported(self.country(), "purchase_order_url"))
    }

    fn questions_url(&self, _tender_html: &str) -> AppResult<String> {
        Err(unsupported(self.country(), "questions_url"))
    }

    async fn questions(&self, _questions_url: &str) -> AppResult<Vec<Question>> {
        Err(unsupported(self.country(), "questions"))
    }

    fn award_url(&self, _tender_html: &str) -> AppResult<String> {
        Err(unsupported(self.country(), "award_url"))
    }

    /// Downloads bulk packages to disk and returns their paths.
    async fn download_packages(&self, _packages: &[MonthlyPackage]) -> AppResult<Vec<PathBuf>> {
        Err(unsupported(self.country(), "download_packages"))
    }
}

/// Adapters by country.
#[derive(Debug, Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<Country, Arc<dyn TenderAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the Chilean and European adapters sharing `http`.
    pub fn with_defaults(http: &HttpClient, settings: &Settings, endpoints: &Endpoints) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ChileAdapter::new(http.clone(), settings, endpoints.clone())));
        registry.register(Arc::new(EuropeAdapter::new(http.clone(), settings, endpoints.clone())));
        registry
    }

    /// Adds or replaces the adapter for its country.
    pub fn register(&mut self, adapter: Arc<dyn TenderAdapter>) {
        self.adapters.insert(adapter.country(), adapter);
    }

    pub fn get(&self, country: Country) -> AppResult<Arc<dyn TenderAdapter>> {
        self.adapters
            .get(&country)
            .cloned()
            .ok_or_else(|| AppError::UnsupportedCountry(country.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        let settings = Settings::default();
        let http = HttpClient::with_cache(&settings, None).unwrap();
        let registry = AdapterRegistry::with_defaults(&http, &settings, &Endpoints::default());

        assert_eq!(registry.get(Country::CL).unwrap().country(), Country::CL);
        assert_eq!(registry.get(Country::EU).unwrap().country(), Country::EU);

        let err = AdapterRegistry::new().get(Country::EU).unwrap_err();
        assert_eq!(err.to_string(), "Country EU is not supported.");
    }

    #[tokio::test]
    async fn test_default_methods_are_unsupported() {
        let settings = Settings::default();
        let http = HttpClient::with_cache(&settings, None).unwrap();
        let adapter = EuropeAdapter::new(http, &settings, Endpoints::default());

        let err = adapter.open_contract("123-2024").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Operation 'open_contract' is not supported for European Union"
        );
        assert!(matches!(
            adapter.award_url("<html></html>"),
            Err(AppError::UnsupportedOperation { .. })
        ));
    }
}
