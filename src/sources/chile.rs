use super::TenderAdapter;
use crate::config::{Endpoints, Settings};
use crate::downloader::{self, AttachmentDownload, HttpClient, RetryConfig};
use crate::errors::AppResult;
use crate::models::{AttachmentInfo, Country, Item, OpenContract, Question};
use crate::parser;
use crate::services::{self, AggregationOptions};
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;

/// Mercado Publico: pages, OCDS records, listing and bulk export.
#[derive(Debug, Clone)]
pub struct ChileAdapter {
    http: HttpClient,
    endpoints: Endpoints,
    retry: RetryConfig,
    concurrency: usize,
    hide_progress: bool,
}

impl ChileAdapter {
    pub fn new(http: HttpClient, settings: &Settings, endpoints: Endpoints) -> Self {
        Self {
            http,
            endpoints,
            retry: RetryConfig::from_settings(settings),
            concurrency: settings.concurrency,
            hide_progress: settings.disable_progress_bar,
        }
    }

    fn base_url(&self) -> &str {
        &self.endpoints.mercado_publico
    }
}

#[async_trait]
impl TenderAdapter for ChileAdapter {
    fn country(&self) -> Country {
        Country::CL
    }

    async fn url(&self, code: &str) -> AppResult<String> {
        downloader::tender::tender_url(&self.http, self.base_url(), code).await
    }

    async fn html(&self, url: &str) -> AppResult<String> {
        self.http.get_text(url).await
    }

    async fn codes_published_on(&self, date: NaiveDate) -> AppResult<Vec<String>> {
        let options = AggregationOptions {
            concurrency: self.concurrency,
            retry: self.retry.clone(),
            hide_progress: self.hide_progress,
        };
        services::codes_published_on(&self.http, &self.endpoints, date, &options).await
    }

    async fn open_contract(&self, code: &str) -> AppResult<OpenContract> {
        downloader::tender::open_contract(&self.http, &self.endpoints.ocds_api, code, &self.retry)
            .await
    }

    fn items(&self, tender_html: &str) -> AppResult<Vec<Item>> {
        parser::tender::items(tender_html)
    }

    fn attachment_url(&self, tender_html: &str) -> AppResult<String> {
        parser::tender::attachment_url(tender_html, self.base_url())
    }

    async fn attachments(&self, attachment_url: &str) -> AppResult<Vec<AttachmentInfo>> {
        let html = self.http.get_text(attachment_url).await?;
        let attachments = parser::attachment::attachments(&html)?;
        debug!(url = attachment_url, count = attachments.len(), "Parsed attachments");
        Ok(attachments)
    }

    async fn attachment_content(
        &self,
        attachment_url: &str,
        attachment: &AttachmentInfo,
    ) -> AppResult<String> {
        let request = AttachmentDownload {
            page_url: attachment_url,
            attachment_id: &attachment.id,
            file_name: &attachment.name,
            size: attachment.size,
        };
        downloader::download_attachment(
            &self.http,
            &request,
            &RetryConfig::attachment_download(),
            self.hide_progress,
        )
        .await
    }

    fn purchase_orders_url(&self, tender_html: &str) -> AppResult<Option<String>> {
        parser::tender::purchase_orders_url(tender_html, self.base_url())
    }

    async fn purchase_order_codes(&self, list_url: &str) -> AppResult<Vec<String>> {
        let html = self.http.get_text(list_url).await?;
        parser::purchase_order::codes(&html)
    }

    fn purchase_order_url(&self, code: &str) -> AppResult<String> {
        Ok(parser::purchase_order::url(code, self.base_url()))
    }

    fn questions_url(&self, tender_html: &str) -> AppResult<String> {
        parser::tender::questions_url(tender_html, self.base_url())
    }

    async fn questions(&self, questions_url: &str) -> AppResult<Vec<Question>> {
        let html = self.http.get_text(questions_url).await?;
        let question_code = parser::tender::question_code(&html)?;
        downloader::tender::questions(&self.http, self.base_url(), &question_code).await
    }

    fn award_url(&self, tender_html: &str) -> AppResult<String> {
        parser::tender::award_url(tender_html, self.base_url())
    }
}
