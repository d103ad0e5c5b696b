use super::cache::{CachedResponse, ResponseCache};
use crate::config::Settings;
use crate::errors::{AppError, AppResult};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

const ACCEPT_LANGUAGE: &str = "es-CL,es;q=0.9,en;q=0.8";

/// HTTP access shared by every downloader of a client instance.
///
/// Default headers are fixed when the client is built. GET and HEAD answers go
/// through the disk cache when one is configured; POSTs never do.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    no_redirect: Client,
    cache: Option<ResponseCache>,
}

impl HttpClient {
    /// Builds the clients and, when `use_cache` is set, the response cache.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the user agent is not a valid header value and
    /// `NetworkError` when the TLS backend cannot be initialised.
    pub fn new(settings: &Settings) -> AppResult<Self> {
        let cache = settings
            .use_cache
            .then(|| ResponseCache::new(&settings.cache_dir, settings.cache_ttl()));
        Self::with_cache(settings, cache)
    }

    pub fn with_cache(settings: &Settings, cache: Option<ResponseCache>) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_str(&settings.user_agent)
                .map_err(|e| AppError::InvalidInput(format!("Invalid user agent: {e}")))?,
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static(ACCEPT_LANGUAGE),
        );

        let client = Client::builder()
            .default_headers(headers.clone())
            .timeout(settings.request_timeout())
            .build()?;
        let no_redirect = Client::builder()
            .default_headers(headers)
            .timeout(settings.request_timeout())
            .redirect(Policy::none())
            .build()?;

        Ok(Self {
            client,
            no_redirect,
            cache,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub async fn get_bytes(&self, url: &str) -> AppResult<Vec<u8>> {
        if let Some(entry) = self.cached("GET", url).await {
            if let Some(body) = entry.body_bytes() {
                return Ok(body);
            }
        }

        debug!(url, "GET");
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.bytes().await?.to_vec();

        self.remember("GET", url, CachedResponse::new(&body, None)).await;
        Ok(body)
    }

    pub async fn get_text(&self, url: &str) -> AppResult<String> {
        let body = self.get_bytes(url).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> AppResult<T> {
        let body = self.get_bytes(url).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Sends a HEAD request without following redirects and returns the
    /// `Location` header, if any.
    pub async fn head_location(&self, url: &str) -> AppResult<Option<String>> {
        if let Some(entry) = self.cached("HEAD", url).await {
            return Ok(entry.location);
        }

        debug!(url, "HEAD");
        let response = self.no_redirect.head(url).send().await?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(AppError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        self.remember("HEAD", url, CachedResponse::new(&[], location.clone()))
            .await;
        Ok(location)
    }

    /// Posts a urlencoded form and returns the response for streaming.
    pub async fn post_form(&self, url: &str, form: &[(String, String)]) -> AppResult<Response> {
        debug!(url, fields = form.len(), "POST form");
        Ok(self
            .client
            .post(url)
            .form(form)
            .send()
            .await?
            .error_for_status()?)
    }

    pub async fn post_form_text(&self, url: &str, form: &[(String, String)]) -> AppResult<String> {
        let response = self.post_form(url, form).await?;
        Ok(response.text().await?)
    }

    pub async fn post_json<B, T>(&self, url: &str, body: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(url, "POST json");
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Evicts a cached answer so the next request reaches the server.
    pub async fn forget(&self, method: &str, url: &str) {
        if let Some(cache) = &self.cache {
            cache.remove(method, url).await;
        }
    }

    async fn cached(&self, method: &str, url: &str) -> Option<CachedResponse> {
        match &self.cache {
            Some(cache) => cache.load(method, url).await,
            None => None,
        }
    }

    async fn remember(&self, method: &str, url: &str, entry: CachedResponse) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(method, url, &entry).await {
                warn!(url, error = %e, "Failed to write cache entry");
            }
        }
    }
}
