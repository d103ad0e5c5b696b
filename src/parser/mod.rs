//! Parsers for Mercado Publico pages and payloads.
//!
//! Every function takes raw text (HTML, JSON) and returns typed values. Parsed
//! documents never leave these functions, so callers can hold the results
//! across `.await` points.

pub mod attachment;
pub mod award;
mod code;
mod html;
pub mod purchase_order;
pub mod questions;
pub mod tender;
mod values;

// Re-export public API
pub use code::{ensure_valid_code, is_valid_public_market_code, tender_tier};
pub use html::HtmlPage;
pub use values::{
    parse_amount, parse_iso_date, parse_ocds_datetime, parse_portal_date, parse_portal_datetime,
    parse_size,
};
