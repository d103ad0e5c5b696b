use crate::config::{Endpoints, Settings};
use crate::downloader::{HttpClient, MonthlyPackage};
use crate::entities::{PurchaseOrder, Tender, Tenders};
use crate::errors::{AppError, AppResult};
use crate::models::Country;
use crate::query::TenderQuery;
use crate::sources::{AdapterRegistry, TenderAdapter};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Entry point of the library.
///
/// Holds the settings and one adapter per country, all sharing a single HTTP
/// client built at construction.
///
/// ```no_run
/// use licitpy::{Country, Licitpy};
///
/// # async fn example() -> licitpy::errors::AppResult<()> {
/// let client = Licitpy::new()?;
/// let tender = client.country(Country::CL)?.get("3955-54-LE24")?;
/// println!("{} {}", tender.code(), tender.title().await?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Licitpy {
    settings: Settings,
    registry: AdapterRegistry,
}

impl Licitpy {
    /// Client with default settings.
    pub fn new() -> AppResult<Self> {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> AppResult<Self> {
        Self::with_endpoints(settings, Endpoints::default())
    }

    /// Client whose adapters talk to `endpoints` instead of the production hosts.
    pub fn with_endpoints(settings: Settings, endpoints: Endpoints) -> AppResult<Self> {
        settings.validate()?;
        endpoints.validate()?;
        let http = HttpClient::new(&settings)?;
        let registry = AdapterRegistry::with_defaults(&http, &settings, &endpoints);
        Ok(Self { settings, registry })
    }

    /// Client over a custom set of adapters.
    pub fn with_registry(settings: Settings, registry: AdapterRegistry) -> AppResult<Self> {
        settings.validate()?;
        Ok(Self { settings, registry })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Handle for one country's tenders.
    pub fn country(&self, country: Country) -> AppResult<CountryClient> {
        Ok(CountryClient {
            adapter: self.registry.get(country)?,
            filter_concurrency: self.settings.filter_concurrency,
        })
    }

    pub fn cl(&self) -> AppResult<CountryClient> {
        self.country(Country::CL)
    }

    pub fn eu(&self) -> AppResult<CountryClient> {
        self.country(Country::EU)
    }
}

/// Tender operations bound to one country.
#[derive(Debug, Clone)]
pub struct CountryClient {
    adapter: Arc<dyn TenderAdapter>,
    filter_concurrency: usize,
}

impl CountryClient {
    pub fn country(&self) -> Country {
        self.adapter.country()
    }

    /// A tender by code. Nothing is fetched until a field is read.
    pub fn get(&self, code: &str) -> AppResult<Tender> {
        Tender::new(code.trim(), Arc::clone(&self.adapter))
    }

    /// Several tenders by code, sorted by code in descending order.
    pub fn get_many<I, S>(&self, codes: I) -> AppResult<Tenders>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tenders = codes
            .into_iter()
            .map(|code| self.get(code.as_ref()))
            .collect::<AppResult<Vec<_>>>()?;
        Ok(Tenders::new(tenders).with_concurrency(self.filter_concurrency))
    }

    /// Starts a search; defaults to tenders published today (UTC).
    pub fn search(&self) -> TenderQuery {
        TenderQuery::new(Arc::clone(&self.adapter))
    }

    pub fn purchase_order(&self, code: &str) -> AppResult<PurchaseOrder> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AppError::InvalidInput("Purchase order code is empty".into()));
        }
        PurchaseOrder::new(code, Arc::clone(&self.adapter))
    }

    /// Downloads one monthly bulk package and returns its path.
    pub async fn download_monthly(&self, year: i32, month: u32) -> AppResult<PathBuf> {
        let package = MonthlyPackage::new(year, month)?;
        let mut paths = self.adapter.download_packages(&[package]).await?;
        paths
            .pop()
            .ok_or_else(|| AppError::TaskError(format!("No path returned for {}", package.period())))
    }

    /// Downloads the twelve monthly packages of `year` concurrently.
    pub async fn download_yearly(&self, year: i32) -> AppResult<Vec<PathBuf>> {
        let packages = MonthlyPackage::year(year)?;
        let paths = self.adapter.download_packages(&packages).await?;
        info!(year, files = paths.len(), "Yearly packages ready");
        Ok(paths)
    }
}
