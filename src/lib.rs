//! licitpy library
//!
//! Client for public procurement tenders published by Mercado Publico (Chile) and
//! TED (European Union). The `licitpy` binary is a thin layer over this crate.
//!
//! ## Overview
//!
//! - [`client`] - The [`Licitpy`] entry point and its per-country handles
//! - [`query`] - Fluent, lazily executed tender searches
//! - [`entities`] - Tenders, purchase orders, awards and attachments, filled on first access
//! - [`sources`] - One adapter per portal behind the [`sources::TenderAdapter`] trait
//! - [`services`] - Aggregation of the OCDS listing with the monthly bulk export
//! - [`downloader`] - HTTP access, response cache, retries and bulk downloads
//! - [`parser`] - HTML, OCDS and CSV parsing into typed values
//! - [`models`] - Status, tier, region and the other portal vocabularies
//! - [`errors`] - Error types used throughout the crate
//!
//! ## Example Usage
//!
//! ```no_run
//! use futures::{pin_mut, StreamExt};
//! use licitpy::{errors::AppResult, Licitpy, Status};
//!
//! # async fn example() -> AppResult<()> {
//! let client = Licitpy::new()?;
//! let stream = client
//!     .cl()?
//!     .search()
//!     .published_yesterday()?
//!     .with_status(Status::Published)
//!     .limit(10)
//!     .stream();
//! pin_mut!(stream);
//!
//! while let Some(tender) = stream.next().await {
//!     let tender = tender?;
//!     println!("{} {}", tender.code(), tender.title().await?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod client;
pub mod concurrency;
pub mod config;
pub mod constants;
pub mod downloader;
pub mod entities;
pub mod errors;
pub mod models;
pub mod parser;
pub mod query;
pub mod services;
pub mod sources;
pub mod ui;
pub mod utils;

pub use client::{CountryClient, Licitpy};
pub use entities::{Attachment, Award, PurchaseOrder, PurchaseOrders, Tender, Tenders};
pub use models::{Country, Region, Status, Tier};
pub use query::{TenderFilters, TenderQuery};
