use super::Tender;
use crate::concurrency::filter_concurrently;
use crate::constants::DEFAULT_FILTER_CONCURRENCY;
use crate::errors::AppResult;
use crate::models::PurchaseOrderStatus;
use crate::parser;
use crate::sources::TenderAdapter;
use chrono::NaiveDate;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// A purchase order. Clones share the fetched page and every parsed field.
#[derive(Clone)]
pub struct PurchaseOrder {
    inner: Arc<PurchaseOrderState>,
}

struct PurchaseOrderState {
    code: String,
    url: String,
    adapter: Arc<dyn TenderAdapter>,
    html: OnceCell<String>,
    status: OnceCell<PurchaseOrderStatus>,
    title: OnceCell<String>,
    issue_date: OnceCell<NaiveDate>,
    tender_code: OnceCell<Option<String>>,
}

impl fmt::Debug for PurchaseOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PurchaseOrder")
            .field("code", &self.inner.code)
            .field("url", &self.inner.url)
            .finish()
    }
}

impl PurchaseOrder {
    pub fn new(code: impl Into<String>, adapter: Arc<dyn TenderAdapter>) -> AppResult<Self> {
        let code = code.into();
        let url = adapter.purchase_order_url(&code)?;
        Ok(Self {
            inner: Arc::new(PurchaseOrderState {
                code,
                url,
                adapter,
                html: OnceCell::new(),
                status: OnceCell::new(),
                title: OnceCell::new(),
                issue_date: OnceCell::new(),
                tender_code: OnceCell::new(),
            }),
        })
    }

    pub fn code(&self) -> &str {
        &self.inner.code
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub async fn html(&self) -> AppResult<&str> {
        self.inner
            .html
            .get_or_try_init(|| self.inner.adapter.html(&self.inner.url))
            .await
            .map(String::as_str)
    }

    pub async fn status(&self) -> AppResult<PurchaseOrderStatus> {
        self.inner
            .status
            .get_or_try_init(|| async { parser::purchase_order::status(self.html().await?) })
            .await
            .copied()
    }

    pub async fn title(&self) -> AppResult<&str> {
        self.inner
            .title
            .get_or_try_init(|| async { parser::purchase_order::title(self.html().await?) })
            .await
            .map(String::as_str)
    }

    pub async fn issue_date(&self) -> AppResult<NaiveDate> {
        self.inner
            .issue_date
            .get_or_try_init(|| async { parser::purchase_order::issue_date(self.html().await?) })
            .await
            .copied()
    }

    /// Code of the originating tender; `None` for direct purchases.
    pub async fn tender_code(&self) -> AppResult<Option<&str>> {
        self.inner
            .tender_code
            .get_or_try_init(|| async { parser::purchase_order::tender_code(self.html().await?) })
            .await
            .map(Option::as_deref)
    }

    /// The originating tender, served by the same source.
    pub async fn tender(&self) -> AppResult<Option<Tender>> {
        match self.tender_code().await? {
            Some(code) => Tender::new(code, Arc::clone(&self.inner.adapter)).map(Some),
            None => Ok(None),
        }
    }
}

/// Purchase orders of a tender, in page order.
#[derive(Debug, Clone)]
pub struct PurchaseOrders {
    orders: Vec<PurchaseOrder>,
    concurrency: usize,
}

impl PurchaseOrders {
    pub fn new(orders: Vec<PurchaseOrder>) -> Self {
        Self {
            orders,
            concurrency: DEFAULT_FILTER_CONCURRENCY,
        }
    }

    /// Workers used by [`with_status`](Self::with_status).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Orders currently in `status`. Orders whose page cannot be read are
    /// logged and left out.
    pub async fn with_status(self, status: PurchaseOrderStatus) -> Self {
        let concurrency = self.concurrency;
        let orders = filter_concurrently(self.orders, concurrency, move |order: PurchaseOrder| async move {
            Ok(order.status().await? == status)
        })
        .await;
        Self { orders, concurrency }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.orders.truncate(limit);
        self
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn codes(&self) -> Vec<&str> {
        self.orders.iter().map(PurchaseOrder::code).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PurchaseOrder> {
        self.orders.iter()
    }
}

impl IntoIterator for PurchaseOrders {
    type Item = PurchaseOrder;
    type IntoIter = std::vec::IntoIter<PurchaseOrder>;

    fn into_iter(self) -> Self::IntoIter {
        self.orders.into_iter()
    }
}

impl<'a> IntoIterator for &'a PurchaseOrders {
    type Item = &'a PurchaseOrder;
    type IntoIter = std::slice::Iter<'a, PurchaseOrder>;

    fn into_iter(self) -> Self::IntoIter {
        self.orders.iter()
    }
}
