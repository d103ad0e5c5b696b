use super::http::HttpClient;
use crate::constants::TED_PAGE_SIZE;
use crate::errors::AppResult;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const SEARCH_PATH: &str = "/v3/notices/search";
const PUBLICATION_NUMBER_FIELD: &str = "publication-number";

#[derive(Debug, Serialize)]
struct SearchRequest {
    query: String,
    fields: [&'static str; 1],
    limit: usize,
    page: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    notices: Vec<Notice>,
    #[serde(rename = "totalNoticeCount", default)]
    total_notice_count: usize,
}

#[derive(Debug, Deserialize)]
struct Notice {
    #[serde(rename = "publication-number")]
    publication_number: String,
}

pub fn notice_url(base_url: &str, code: &str) -> String {
    format!("{base_url}/en/notice/{code}/html")
}

/// Publication numbers of every notice published on `date`, page by page.
pub async fn notice_codes(http: &HttpClient, api_base_url: &str, date: NaiveDate) -> AppResult<Vec<String>> {
    let url = format!("{api_base_url}{SEARCH_PATH}");
    let mut codes = Vec::new();
    let mut page = 1;

    loop {
        let request = SearchRequest {
            query: format!("publication-date={}", date.format("%Y%m%d")),
            fields: [PUBLICATION_NUMBER_FIELD],
            limit: TED_PAGE_SIZE,
            page,
        };
        let response: SearchResponse = http.post_json(&url, &request).await?;
        let received = response.notices.len();
        codes.extend(
            response
                .notices
                .into_iter()
                .map(|notice| notice.publication_number),
        );
        debug!(page, received, total = response.total_notice_count, "Fetched TED page");

        if received == 0 || codes.len() >= response.total_notice_count {
            break;
        }
        page += 1;
    }

    info!(date = %date, codes = codes.len(), "Fetched TED notice codes");
    Ok(codes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_url() {
        assert_eq!(
            notice_url("https://ted.europa.eu", "123456-2024"),
            "https://ted.europa.eu/en/notice/123456-2024/html"
        );
    }

    #[test]
    fn test_search_request_shape() {
        let request = SearchRequest {
            query: "publication-date=20240102".into(),
            fields: [PUBLICATION_NUMBER_FIELD],
            limit: TED_PAGE_SIZE,
            page: 1,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "query": "publication-date=20240102",
                "fields": ["publication-number"],
                "limit": 250,
                "page": 1
            })
        );
    }
}
