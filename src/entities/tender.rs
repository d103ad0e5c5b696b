use super::{Attachment, Award, PurchaseOrder, PurchaseOrders};
use crate::errors::{AppError, AppResult};
use crate::models::{Country, Item, OpenContract, Question, Region, Status, Tier};
use crate::parser;
use crate::sources::TenderAdapter;
use crate::utils::santiago_now;
use chrono::DateTime;
use chrono_tz::Tz;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

/// A tender, identified by its code.
///
/// Only the code is known at construction. Every other field is fetched or
/// parsed on first access and kept for the lifetime of the value; clones share
/// the same cache, so a field is computed once however many handles exist.
#[derive(Clone)]
pub struct Tender {
    inner: Arc<TenderState>,
}

struct TenderState {
    code: String,
    adapter: Arc<dyn TenderAdapter>,
    url: OnceCell<String>,
    html: OnceCell<String>,
    open_contract: OnceCell<OpenContract>,
    status: OnceCell<Status>,
    title: OnceCell<String>,
    description: OnceCell<String>,
    opening_date: OnceCell<DateTime<Tz>>,
    closing_date: OnceCell<DateTime<Tz>>,
    region: OnceCell<Region>,
    attachment_url: OnceCell<String>,
    attachments: OnceCell<Vec<Attachment>>,
    purchase_orders: OnceCell<PurchaseOrders>,
    items: OnceCell<Vec<Item>>,
    questions: OnceCell<Vec<Question>>,
    award: OnceCell<Award>,
}

impl fmt::Debug for Tender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tender")
            .field("code", &self.inner.code)
            .field("country", &self.country())
            .finish()
    }
}

impl Tender {
    /// Creates a tender served by `adapter`.
    ///
    /// # Errors
    ///
    /// Chilean codes must follow the public market grammar
    /// (`^\d{4,6}-\d{1,2}-(TIER)\d{2}$`); anything else is `InvalidTenderCode`.
    pub fn new(code: impl Into<String>, adapter: Arc<dyn TenderAdapter>) -> AppResult<Self> {
        let code = code.into();
        if adapter.country() == Country::CL {
            parser::ensure_valid_code(&code)?;
        }

        Ok(Self {
            inner: Arc::new(TenderState {
                code,
                adapter,
                url: OnceCell::new(),
                html: OnceCell::new(),
                open_contract: OnceCell::new(),
                status: OnceCell::new(),
                title: OnceCell::new(),
                description: OnceCell::new(),
                opening_date: OnceCell::new(),
                closing_date: OnceCell::new(),
                region: OnceCell::new(),
                attachment_url: OnceCell::new(),
                attachments: OnceCell::new(),
                purchase_orders: OnceCell::new(),
                items: OnceCell::new(),
                questions: OnceCell::new(),
                award: OnceCell::new(),
            }),
        })
    }

    pub fn code(&self) -> &str {
        &self.inner.code
    }

    pub fn country(&self) -> Country {
        self.inner.adapter.country()
    }

    /// Budget tier, read from the code itself.
    pub fn tier(&self) -> AppResult<Tier> {
        parser::tender_tier(&self.inner.code)
    }

    pub async fn url(&self) -> AppResult<&str> {
        self.inner
            .url
            .get_or_try_init(|| self.inner.adapter.url(&self.inner.code))
            .await
            .map(String::as_str)
    }

    pub async fn html(&self) -> AppResult<&str> {
        self.inner
            .html
            .get_or_try_init(|| async {
                let url = self.url().await?;
                self.inner.adapter.html(url).await
            })
            .await
            .map(String::as_str)
    }

    pub async fn open_contract(&self) -> AppResult<&OpenContract> {
        self.inner
            .open_contract
            .get_or_try_init(|| self.inner.adapter.open_contract(&self.inner.code))
            .await
    }

    /// Canonical status.
    ///
    /// OCDS keeps reporting `active` after bidding closes, so a published
    /// tender past its closing date takes the status shown on its page.
    pub async fn status(&self) -> AppResult<Status> {
        self.inner
            .status
            .get_or_try_init(|| self.resolve_status())
            .await
            .copied()
    }

    async fn resolve_status(&self) -> AppResult<Status> {
        let status = parser::tender::ocds_status(self.open_contract().await?)?;
        if status != Status::Published {
            return Ok(status);
        }

        let closing_date = self.closing_date().await?;
        if !parser::tender::needs_html_status(status, Some(&closing_date), &santiago_now()) {
            return Ok(status);
        }

        debug!(code = %self.inner.code, "Published tender past closing date, reading status from page");
        parser::tender::status_from_html(self.html().await?)
    }

    pub async fn title(&self) -> AppResult<&str> {
        self.inner
            .title
            .get_or_try_init(|| async { parser::tender::title(self.open_contract().await?) })
            .await
            .map(String::as_str)
    }

    pub async fn description(&self) -> AppResult<&str> {
        self.inner
            .description
            .get_or_try_init(|| async { parser::tender::description(self.open_contract().await?) })
            .await
            .map(String::as_str)
    }

    pub async fn opening_date(&self) -> AppResult<DateTime<Tz>> {
        self.inner
            .opening_date
            .get_or_try_init(|| async { parser::tender::opening_date(self.open_contract().await?) })
            .await
            .copied()
    }

    /// Closing date from OCDS, or from the page when OCDS has none.
    pub async fn closing_date(&self) -> AppResult<DateTime<Tz>> {
        self.inner
            .closing_date
            .get_or_try_init(|| async {
                match parser::tender::closing_date_from_ocds(self.open_contract().await?)? {
                    Some(closing_date) => Ok(closing_date),
                    None => parser::tender::closing_date_from_html(self.html().await?),
                }
            })
            .await
            .copied()
    }

    pub async fn region(&self) -> AppResult<Region> {
        self.inner
            .region
            .get_or_try_init(|| async { parser::tender::region(self.open_contract().await?) })
            .await
            .copied()
    }

    pub async fn attachment_url(&self) -> AppResult<&str> {
        self.inner
            .attachment_url
            .get_or_try_init(|| async { self.inner.adapter.attachment_url(self.html().await?) })
            .await
            .map(String::as_str)
    }

    pub async fn attachments(&self) -> AppResult<&[Attachment]> {
        self.inner
            .attachments
            .get_or_try_init(|| async {
                let page_url = self.attachment_url().await?;
                let attachments = self.inner.adapter.attachments(page_url).await?;
                Ok::<_, AppError>(
                    attachments
                        .into_iter()
                        .map(|info| Attachment::new(info, page_url.to_string(), Arc::clone(&self.inner.adapter)))
                        .collect(),
                )
            })
            .await
            .map(Vec::as_slice)
    }

    /// The attachment holding the signed tender base.
    pub async fn signed_base(&self) -> AppResult<&Attachment> {
        parser::attachment::signed_base(self.attachments().await?)
    }

    /// Purchase orders issued from this tender; empty when there are none yet.
    pub async fn purchase_orders(&self) -> AppResult<&PurchaseOrders> {
        self.inner
            .purchase_orders
            .get_or_try_init(|| self.fetch_purchase_orders())
            .await
    }

    async fn fetch_purchase_orders(&self) -> AppResult<PurchaseOrders> {
        let Some(list_url) = self.inner.adapter.purchase_orders_url(self.html().await?)? else {
            return Ok(PurchaseOrders::new(Vec::new()));
        };

        let orders = self
            .inner
            .adapter
            .purchase_order_codes(&list_url)
            .await?
            .into_iter()
            .map(|code| PurchaseOrder::new(code, Arc::clone(&self.inner.adapter)))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(PurchaseOrders::new(orders))
    }

    pub async fn items(&self) -> AppResult<&[Item]> {
        self.inner
            .items
            .get_or_try_init(|| async { self.inner.adapter.items(self.html().await?) })
            .await
            .map(Vec::as_slice)
    }

    pub async fn questions(&self) -> AppResult<&[Question]> {
        self.inner
            .questions
            .get_or_try_init(|| async {
                let questions_url = self.inner.adapter.questions_url(self.html().await?)?;
                self.inner.adapter.questions(&questions_url).await
            })
            .await
            .map(Vec::as_slice)
    }

    pub async fn award(&self) -> AppResult<&Award> {
        self.inner
            .award
            .get_or_try_init(|| async {
                let award_url = self.inner.adapter.award_url(self.html().await?)?;
                Ok::<_, AppError>(Award::new(award_url, Arc::clone(&self.inner.adapter)))
            })
            .await
    }
}
