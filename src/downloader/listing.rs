use super::http::HttpClient;
use crate::concurrency::try_fan_out;
use crate::constants::{LISTING_PAGE_SIZE, OCDS_LISTING_PATH};
use crate::errors::AppResult;
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
pub(crate) struct ListingPage {
    pagination: Pagination,
    #[serde(default)]
    data: Vec<ListingEntry>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    total: usize,
}

#[derive(Debug, Deserialize)]
struct ListingEntry {
    #[serde(rename = "urlTender", default)]
    url_tender: Option<String>,
}

impl ListingPage {
    /// Codes are the last path segment of `urlTender`. Some entries carry only
    /// the base path (`.../data/tender/`) and are skipped.
    fn codes(&self) -> impl Iterator<Item = String> + '_ {
        self.data
            .iter()
            .filter_map(|entry| entry.url_tender.as_deref())
            .filter_map(|url| url.trim().rsplit('/').next())
            .filter(|code| !code.is_empty())
            .map(str::to_string)
    }
}

pub fn listing_url(base_url: &str, year: i32, month: u32, skip: usize) -> String {
    format!("{base_url}{OCDS_LISTING_PATH}/{year}/{month:02}/{skip}/{LISTING_PAGE_SIZE}")
}

/// Fetches every tender code the OCDS listing publishes for a month.
///
/// The first page gives `pagination.total`; the remaining pages are fetched
/// concurrently. Codes keep page order and may contain duplicates.
///
/// # Errors
///
/// Fails if any page fails, after the other page requests are cancelled.
pub async fn fetch_month_codes(
    http: &HttpClient,
    base_url: &str,
    year: i32,
    month: u32,
    concurrency: usize,
) -> AppResult<Vec<String>> {
    let first: ListingPage = http.get_json(&listing_url(base_url, year, month, 0)).await?;
    let total = first.pagination.total;
    let mut codes: Vec<String> = first.codes().collect();

    let skips: Vec<usize> = (LISTING_PAGE_SIZE..total).step_by(LISTING_PAGE_SIZE).collect();
    debug!(year, month, total, pages = skips.len() + 1, "Fetching listing pages");

    let client = http.clone();
    let base = base_url.to_string();
    let pages = try_fan_out(skips, concurrency, None, move |skip| {
        let client = client.clone();
        let url = listing_url(&base, year, month, skip);
        async move { client.get_json::<ListingPage>(&url).await }
    })
    .await?;

    for page in &pages {
        codes.extend(page.codes());
    }

    info!(year, month, codes = codes.len(), "Fetched tender codes from listing");
    Ok(codes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_url() {
        assert_eq!(
            listing_url("https://api.mercadopublico.cl", 2024, 3, 2000),
            "https://api.mercadopublico.cl/APISOCDS/OCDS/listaOCDSAgnoMes/2024/03/2000/1000"
        );
    }

    #[test]
    fn test_codes_skip_base_paths() {
        let page: ListingPage = serde_json::from_str(
            r#"{
                "pagination": {"total": 3},
                "data": [
                    {"ocid": "ocds-70d2nz-2669-49-L125", "urlTender": "https://apis.mercadopublico.cl/OCDS/data/tender/2669-49-L125"},
                    {"ocid": "ocds-70d2nz-", "urlTender": "https://apis.mercadopublico.cl/OCDS/data/tender/"},
                    {"ocid": "ocds-70d2nz-x"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(page.codes().collect::<Vec<_>>(), vec!["2669-49-L125"]);
    }
}
