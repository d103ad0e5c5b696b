//! Fluent tender search.
//!
//! A [`TenderQuery`] only records filters. Nothing is fetched until the query is
//! turned into a stream (or collected), and it is consumed in the process.

use crate::entities::Tender;
use crate::errors::{AppError, AppResult};
use crate::models::{Region, Status, Tier};
use crate::sources::TenderAdapter;
use crate::utils::{is_weekend, today_utc, yesterday_utc};
use async_stream::try_stream;
use chrono::NaiveDate;
use futures::{Stream, TryStreamExt};
use std::sync::Arc;
use tracing::{debug, info};

/// Filters of a tender search. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenderFilters {
    /// Publication day; today (UTC) when unset
    pub published_on: Option<NaiveDate>,
    pub status: Option<Status>,
    pub tier: Option<Tier>,
    pub region: Option<Region>,
    pub limit: Option<usize>,
}

impl TenderFilters {
    /// Whether `tender` passes every filter. Cheap filters run first so remote
    /// lookups are skipped for tenders already excluded.
    async fn matches(&self, tender: &Tender) -> AppResult<bool> {
        if let Some(tier) = self.tier {
            if tender.tier()? != tier {
                return Ok(false);
            }
        }
        if let Some(region) = self.region {
            if tender.region().await? != region {
                return Ok(false);
            }
        }
        if let Some(status) = self.status {
            if tender.status().await? != status {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Rejects days the portals cannot have published on yet, and weekends unless
/// explicitly allowed.
pub fn validate_publication_date(
    date: NaiveDate,
    today: NaiveDate,
    allow_weekends: bool,
) -> AppResult<()> {
    if date > today {
        return Err(AppError::InvalidInput(format!(
            "Date cannot be in the future: {date}. Please provide a valid date."
        )));
    }
    if is_weekend(date) && !allow_weekends {
        return Err(AppError::NonBusinessDay(date));
    }
    Ok(())
}

/// A deferred tender search against one source.
#[derive(Debug)]
pub struct TenderQuery {
    adapter: Arc<dyn TenderAdapter>,
    filters: TenderFilters,
}

impl TenderQuery {
    pub fn new(adapter: Arc<dyn TenderAdapter>) -> Self {
        Self {
            adapter,
            filters: TenderFilters::default(),
        }
    }

    pub fn filters(&self) -> &TenderFilters {
        &self.filters
    }

    /// Tenders published on `date`.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for future dates, `NonBusinessDay` for weekends unless
    /// `allow_weekends` is set.
    pub fn published_on(mut self, date: NaiveDate, allow_weekends: bool) -> AppResult<Self> {
        validate_publication_date(date, today_utc(), allow_weekends)?;
        self.filters.published_on = Some(date);
        Ok(self)
    }

    /// Tenders published today (UTC).
    pub fn published_today(self) -> AppResult<Self> {
        self.published_on(today_utc(), false)
    }

    /// Tenders published yesterday (UTC).
    pub fn published_yesterday(self) -> AppResult<Self> {
        self.published_on(yesterday_utc(), false)
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.filters.status = Some(status);
        self
    }

    pub fn by_budget_tier(mut self, tier: Tier) -> Self {
        self.filters.tier = Some(tier);
        self
    }

    pub fn in_region(mut self, region: Region) -> Self {
        self.filters.region = Some(region);
        self
    }

    /// Stops after `count` matching tenders.
    pub fn limit(mut self, count: usize) -> Self {
        self.filters.limit = Some(count);
        self
    }

    /// Runs the search, yielding matching tenders in code order as they are
    /// checked.
    ///
    /// Codes are fetched once up front; filters are then evaluated one tender
    /// at a time, and no work is done past the limit. The first error, whether
    /// listing the codes, building a tender or evaluating a filter, ends the
    /// stream.
    pub fn stream(self) -> impl Stream<Item = AppResult<Tender>> + Send + 'static {
        let Self { adapter, filters } = self;

        try_stream! {
            let date = filters.published_on.unwrap_or_else(today_utc);
            let codes = adapter.codes_published_on(date).await?;
            info!(%date, codes = codes.len(), country = %adapter.country(), "Searching tenders");

            let mut found = 0usize;
            for code in codes {
                if filters.limit.is_some_and(|limit| found >= limit) {
                    debug!(limit = found, "Search limit reached");
                    break;
                }

                let tender = Tender::new(code.as_str(), Arc::clone(&adapter))?;
                if filters.matches(&tender).await? {
                    found += 1;
                    yield tender;
                }
            }
        }
    }

    /// Runs the search and waits for every result.
    pub async fn collect(self) -> AppResult<Vec<Tender>> {
        self.stream().try_collect().await
    }
}
