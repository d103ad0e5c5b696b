//! Lazily populated domain objects.
//!
//! Entities hold a code (or URL) and the adapter that serves it. Fields are
//! fetched on first access through `tokio::sync::OnceCell` and never invalidated.

mod attachment;
mod award;
mod purchase_order;
mod tender;
mod tenders;

pub use attachment::Attachment;
pub use award::Award;
pub use purchase_order::{PurchaseOrder, PurchaseOrders};
pub use tender::Tender;
pub use tenders::Tenders;
