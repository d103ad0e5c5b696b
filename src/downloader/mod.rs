//! Network access to the procurement portals.
//!
//! Every request goes through one [`HttpClient`] per client instance. Modules here
//! fetch raw payloads (pages, OCDS records, listing pages, bulk exports, attachment
//! bytes, TED search results) and hand them to [`crate::parser`]; they never keep
//! state of their own beyond the optional response cache.

pub mod attachment;
pub mod bulk;
mod cache;
mod file_downloader;
mod http;
pub mod listing;
mod retry;
pub mod ted;
pub mod tender;

// Re-export public API
pub use attachment::{download_attachment, AttachmentDownload};
pub use bulk::BulkTender;
pub use cache::{CachedResponse, ResponseCache};
pub use file_downloader::{download_packages, MonthlyPackage, PackageDownload};
pub use http::HttpClient;
pub use retry::{with_retry, Backoff, RetryConfig};
