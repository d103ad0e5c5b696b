use super::http::HttpClient;
use super::retry::{with_retry, RetryConfig};
use crate::errors::AppResult;
use crate::parser;
use crate::ui;
use crate::utils::buffer_capacity;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::info;

const DEFAULT_VIEW_STATE_GENERATOR: &str = "13285B56";

/// Post-back fields that press the download button of row `attachment_id`.
pub fn download_form(
    view_state: &str,
    view_state_generator: Option<&str>,
    attachment_id: &str,
) -> Vec<(String, String)> {
    let button = format!("DWNL$grdId$ctl{attachment_id}$search");
    vec![
        ("__EVENTTARGET".to_string(), String::new()),
        ("__EVENTARGUMENT".to_string(), String::new()),
        ("__VIEWSTATE".to_string(), view_state.to_string()),
        (
            "__VIEWSTATEGENERATOR".to_string(),
            view_state_generator
                .unwrap_or(DEFAULT_VIEW_STATE_GENERATOR)
                .to_string(),
        ),
        (format!("{button}.x"), "8".to_string()),
        (format!("{button}.y"), "5".to_string()),
    ]
}

/// Request for one attachment of a tender.
#[derive(Debug, Clone)]
pub struct AttachmentDownload<'a> {
    pub page_url: &'a str,
    pub attachment_id: &'a str,
    pub file_name: &'a str,
    pub size: u64,
}

/// Downloads an attachment and returns its content base64 encoded.
///
/// The page is posted back with its own view state; the body is streamed in
/// chunks and the whole transfer is retried with linear backoff.
pub async fn download_attachment(
    http: &HttpClient,
    request: &AttachmentDownload<'_>,
    retry: &RetryConfig,
    hide_progress: bool,
) -> AppResult<String> {
    let page = http.get_text(request.page_url).await?;
    let view_state = parser::attachment::view_state(&page)?;
    let generator = parser::attachment::view_state_generator(&page)?;
    let form = download_form(&view_state, generator.as_deref(), request.attachment_id);

    let content = with_retry(retry, request.file_name, || async {
        let pb = ui::create_download_bar(request.size, request.file_name, hide_progress)?;
        let mut response = http.post_form(request.page_url, &form).await?;
        let mut content = Vec::with_capacity(buffer_capacity(request.size));

        while let Some(chunk) = response.chunk().await? {
            content.extend_from_slice(&chunk);
            pb.inc(chunk.len() as u64);
        }
        pb.finish_and_clear();
        Ok(content)
    })
    .await?;

    info!(
        file_name = request.file_name,
        bytes = content.len(),
        "Downloaded attachment"
    );
    Ok(STANDARD.encode(content))
}
