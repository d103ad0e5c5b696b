use crate::concurrency::try_fan_out;
use crate::config::Endpoints;
use crate::constants::QA_TENDER_PREFIX;
use crate::downloader::{bulk, listing, tender, BulkTender, HttpClient, RetryConfig};
use crate::errors::{AppError, AppResult};
use crate::parser;
use crate::ui;
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeSet, HashSet};
use tracing::{info, warn};

/// Knobs for one aggregation run.
#[derive(Debug, Clone)]
pub struct AggregationOptions {
    /// Concurrent OCDS lookups for codes missing from the bulk export
    pub concurrency: usize,
    pub retry: RetryConfig,
    pub hide_progress: bool,
}

/// Codes of every tender published on `date`, merged from the OCDS listing and
/// the monthly bulk export.
///
/// The bulk export carries publication dates; codes that only the listing knows
/// get theirs from the OCDS opening date. Internal QA tenders are dropped and
/// the result is sorted.
///
/// # Errors
///
/// Fails when the listing or the bulk export cannot be fetched or parsed, or
/// when any OCDS date lookup still fails after its retries.
pub async fn codes_published_on(
    http: &HttpClient,
    endpoints: &Endpoints,
    date: NaiveDate,
    options: &AggregationOptions,
) -> AppResult<Vec<String>> {
    let (year, month) = (date.year(), date.month());

    let (listed, exported) = tokio::try_join!(
        listing::fetch_month_codes(http, &endpoints.listing_api, year, month, options.concurrency),
        month_export(http, &endpoints.bulk_csv, year, month),
    )?;

    let exported_codes: HashSet<&str> = exported.iter().map(|t| t.code.as_str()).collect();
    let api_only: Vec<String> = listed
        .into_iter()
        .filter(|code| !exported_codes.contains(code.as_str()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    info!(
        %date,
        exported = exported.len(),
        api_only = api_only.len(),
        "Resolving publication dates"
    );

    let resolved = resolve_publication_dates(http, &endpoints.ocds_api, api_only, options).await?;
    let codes = select_published_on(date, &exported, resolved);

    info!(%date, codes = codes.len(), "Aggregated tender codes");
    Ok(codes)
}

/// The export for the current month is usually not published yet; a 404 means
/// "nothing exported", not a failure.
async fn month_export(
    http: &HttpClient,
    base_url: &str,
    year: i32,
    month: u32,
) -> AppResult<Vec<BulkTender>> {
    match bulk::fetch_month_tenders(http, base_url, year, month).await {
        Err(AppError::HttpStatus { status: 404, url }) => {
            warn!(url = %url, "Bulk export not available, using the listing only");
            Ok(Vec::new())
        }
        other => other,
    }
}

async fn resolve_publication_dates(
    http: &HttpClient,
    ocds_base_url: &str,
    codes: Vec<String>,
    options: &AggregationOptions,
) -> AppResult<Vec<(String, NaiveDate)>> {
    if codes.is_empty() {
        return Ok(Vec::new());
    }

    let pb = ui::create_progress_bar(codes.len() as u64, options.hide_progress)?;
    let client = http.clone();
    let base = ocds_base_url.to_string();
    let retry = options.retry.clone();

    let dates = try_fan_out(codes.clone(), options.concurrency, Some(pb), move |code: String| {
        let client = client.clone();
        let base = base.clone();
        let retry = retry.clone();
        async move {
            let record = tender::open_contract(&client, &base, &code, &retry).await?;
            let opening = parser::tender::opening_date(&record)?;
            Ok(opening.date_naive())
        }
    })
    .await?;

    Ok(codes.into_iter().zip(dates).collect())
}

/// Keeps the codes published on `date`, without QA tenders, sorted and unique.
pub(crate) fn select_published_on(
    date: NaiveDate,
    exported: &[BulkTender],
    resolved: Vec<(String, NaiveDate)>,
) -> Vec<String> {
    exported
        .iter()
        .map(|tender| (tender.code.clone(), tender.published_on))
        .chain(resolved)
        .filter(|(code, published_on)| *published_on == date && !code.starts_with(QA_TENDER_PREFIX))
        .map(|(code, _)| code)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
