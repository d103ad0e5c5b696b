use super::Tender;
use crate::concurrency::{filter_concurrently, try_fan_out};
use crate::constants::DEFAULT_FILTER_CONCURRENCY;
use crate::errors::AppResult;
use crate::models::{Region, Status, Tier};
use tracing::info;

/// A set of tenders, kept sorted by code in descending order.
#[derive(Debug, Clone)]
pub struct Tenders {
    tenders: Vec<Tender>,
    concurrency: usize,
}

impl Tenders {
    pub fn new(mut tenders: Vec<Tender>) -> Self {
        tenders.sort_by(|a, b| b.code().cmp(a.code()));
        Self {
            tenders,
            concurrency: DEFAULT_FILTER_CONCURRENCY,
        }
    }

    /// Workers used by the filters that need remote data.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Tenders currently in `status`.
    ///
    /// Statuses are resolved concurrently; a tender whose status cannot be
    /// determined is logged and left out.
    pub async fn with_status(self, status: Status) -> Self {
        let before = self.tenders.len();
        let concurrency = self.concurrency;
        let tenders = filter_concurrently(self.tenders, concurrency, move |tender: Tender| async move {
            Ok(tender.status().await? == status)
        })
        .await;

        info!(status = %status, before, after = tenders.len(), "Filtered tenders by status");
        Self { tenders, concurrency }
    }

    /// Tenders in `region`. Regions are resolved concurrently.
    ///
    /// # Errors
    ///
    /// The first tender whose region cannot be determined fails the whole call.
    pub async fn in_region(self, region: Region) -> AppResult<Self> {
        let concurrency = self.concurrency;
        let checked = try_fan_out(self.tenders, concurrency, None, move |tender: Tender| async move {
            let keep = tender.region().await? == region;
            Ok((tender, keep))
        })
        .await?;

        let tenders = checked
            .into_iter()
            .filter_map(|(tender, keep)| keep.then_some(tender))
            .collect();
        Ok(Self { tenders, concurrency })
    }

    /// Tenders of budget tier `tier`. The tier comes from the code, so this
    /// needs no requests.
    pub fn by_budget_tier(mut self, tier: Tier) -> Self {
        self.tenders
            .retain(|tender| tender.tier().map(|t| t == tier).unwrap_or(false));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.tenders.truncate(limit);
        self
    }

    pub fn len(&self) -> usize {
        self.tenders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenders.is_empty()
    }

    pub fn codes(&self) -> Vec<&str> {
        self.tenders.iter().map(Tender::code).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tender> {
        self.tenders.iter()
    }
}

impl IntoIterator for Tenders {
    type Item = Tender;
    type IntoIter = std::vec::IntoIter<Tender>;

    fn into_iter(self) -> Self::IntoIter {
        self.tenders.into_iter()
    }
}

impl<'a> IntoIterator for &'a Tenders {
    type Item = &'a Tender;
    type IntoIter = std::slice::Iter<'a, Tender>;

    fn into_iter(self) -> Self::IntoIter {
        self.tenders.iter()
    }
}
