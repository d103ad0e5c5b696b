use super::http::HttpClient;
use super::retry::{with_retry, RetryConfig};
use crate::constants::{OCDS_RECORD_PATH, QUESTIONS_SERVICE_PATH, TENDER_DETAILS_PATH};
use crate::errors::{AppError, AppResult};
use crate::models::{OpenContract, Question};
use crate::parser;
use crate::parser::tender::extract_query_string;
use tracing::debug;

/// Resolves the public page of a tender.
///
/// The portal answers `?idlicitacion={code}` with a redirect whose `qs=`
/// parameter is the stable page address.
pub async fn tender_url(http: &HttpClient, base_url: &str, code: &str) -> AppResult<String> {
    let lookup = format!("{base_url}{TENDER_DETAILS_PATH}?idlicitacion={code}");
    let location = http.head_location(&lookup).await?.ok_or_else(|| {
        AppError::FieldNotFound(format!("No redirect found for tender {code}"))
    })?;

    let query = extract_query_string(&location).ok_or_else(|| {
        AppError::FieldNotFound(format!("Tender query string not found for {code}"))
    })?;

    Ok(format!("{base_url}{TENDER_DETAILS_PATH}?qs={query}"))
}

pub fn open_contract_url(base_url: &str, code: &str) -> String {
    format!("{base_url}{OCDS_RECORD_PATH}/{code}")
}

/// Fetches the OCDS record of a tender.
///
/// The API sometimes answers 200 without `records`; that answer is evicted
/// from the cache and retried like a network failure.
pub async fn open_contract(
    http: &HttpClient,
    base_url: &str,
    code: &str,
    retry: &RetryConfig,
) -> AppResult<OpenContract> {
    let url = open_contract_url(base_url, code);

    with_retry(retry, &url, || async {
        let payload: serde_json::Value = http.get_json(&url).await?;
        if payload.get("records").is_none() {
            http.forget("GET", &url).await;
            return Err(AppError::IncompleteRecord(code.to_string()));
        }
        debug!(code, "Fetched OCDS record");
        Ok(serde_json::from_value::<OpenContract>(payload)?)
    })
    .await
}

/// Fetches the forum questions for the internal forum code.
pub async fn questions(
    http: &HttpClient,
    base_url: &str,
    question_code: &str,
) -> AppResult<Vec<Question>> {
    let url = format!("{base_url}{QUESTIONS_SERVICE_PATH}");
    let form = vec![
        ("opt".to_string(), "101".to_string()),
        ("RbfCode".to_string(), question_code.to_string()),
    ];
    let body = http.post_form_text(&url, &form).await?;
    parser::questions::questions(&body)
}
