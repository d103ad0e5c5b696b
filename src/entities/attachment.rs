use crate::errors::{AppError, AppResult};
use crate::models::{AttachmentInfo, FileType};
use crate::sources::TenderAdapter;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// A tender attachment. The content is downloaded on first request.
#[derive(Debug)]
pub struct Attachment {
    info: AttachmentInfo,
    page_url: String,
    adapter: Arc<dyn TenderAdapter>,
    content: OnceCell<String>,
    file_type: OnceCell<FileType>,
}

impl Attachment {
    pub fn new(info: AttachmentInfo, page_url: String, adapter: Arc<dyn TenderAdapter>) -> Self {
        Self {
            info,
            page_url,
            adapter,
            content: OnceCell::new(),
            file_type: OnceCell::new(),
        }
    }

    pub fn info(&self) -> &AttachmentInfo {
        &self.info
    }

    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn attachment_type(&self) -> &str {
        &self.info.attachment_type
    }

    pub fn description(&self) -> &str {
        &self.info.description
    }

    /// Size in bytes as announced by the portal.
    pub fn size(&self) -> u64 {
        self.info.size
    }

    pub fn upload_date(&self) -> &str {
        &self.info.upload_date
    }

    /// Base64 encoded content.
    pub async fn content(&self) -> AppResult<&str> {
        self.content
            .get_or_try_init(|| self.adapter.attachment_content(&self.page_url, &self.info))
            .await
            .map(String::as_str)
    }

    pub async fn bytes(&self) -> AppResult<Vec<u8>> {
        let content = self.content().await?;
        STANDARD
            .decode(content)
            .map_err(|e| AppError::ParseError(format!("Base64: {e}")))
    }

    /// Type detected from the downloaded bytes, falling back to the file name.
    pub async fn file_type(&self) -> AppResult<FileType> {
        self.file_type
            .get_or_try_init(|| async {
                let bytes = self.bytes().await?;
                Ok::<_, AppError>(FileType::detect(&bytes, &self.info.name))
            })
            .await
            .copied()
    }
}

impl AsRef<AttachmentInfo> for Attachment {
    fn as_ref(&self) -> &AttachmentInfo {
        &self.info
    }
}
