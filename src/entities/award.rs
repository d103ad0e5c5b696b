use crate::errors::AppResult;
use crate::models::AwardResult;
use crate::parser;
use crate::sources::TenderAdapter;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Award act of a tender, read from its preview page.
#[derive(Debug)]
pub struct Award {
    url: String,
    adapter: Arc<dyn TenderAdapter>,
    html: OnceCell<String>,
    method: OnceCell<String>,
    amount: OnceCell<i64>,
    estimated_amount: OnceCell<i64>,
    results: OnceCell<AwardResult>,
}

impl Award {
    pub fn new(url: String, adapter: Arc<dyn TenderAdapter>) -> Self {
        Self {
            url,
            adapter,
            html: OnceCell::new(),
            method: OnceCell::new(),
            amount: OnceCell::new(),
            estimated_amount: OnceCell::new(),
            results: OnceCell::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn html(&self) -> AppResult<&str> {
        self.html
            .get_or_try_init(|| self.adapter.html(&self.url))
            .await
            .map(String::as_str)
    }

    /// Award type, e.g. "Adjudicación Simple".
    pub async fn method(&self) -> AppResult<&str> {
        self.method
            .get_or_try_init(|| async { parser::award::method(self.html().await?) })
            .await
            .map(String::as_str)
    }

    pub async fn amount(&self) -> AppResult<i64> {
        self.amount
            .get_or_try_init(|| async { parser::award::amount(self.html().await?) })
            .await
            .copied()
    }

    pub async fn estimated_amount(&self) -> AppResult<i64> {
        self.estimated_amount
            .get_or_try_init(|| async { parser::award::estimated_amount(self.html().await?) })
            .await
            .copied()
    }

    /// Per-item results with every supplier bid.
    pub async fn results(&self) -> AppResult<&AwardResult> {
        self.results
            .get_or_try_init(|| async { parser::award::results(self.html().await?) })
            .await
    }
}
