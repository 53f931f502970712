use crate::amber::rate_limit::{self, RATE_LIMIT_RESET_HEADER};
use crate::amber::types::{CurrentPriceOptions, PriceInterval, Site, UsageInterval};
use crate::amber::{DATE_FORMAT, PricingApi};
use crate::config::ApiConfig;
use crate::error::{MonitorError, Result};
use crate::logging::{StructuredLogger, get_logger};
use crate::store::SessionStore;
use chrono::{NaiveDate, Utc};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, RETRY_AFTER, USER_AGENT};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// Amber REST client
///
/// Stateless between calls apart from reading the stored API key, which
/// happens on every request so a logout takes effect immediately.
pub struct AmberClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn SessionStore>,
    logger: StructuredLogger,
}

impl AmberClient {
    /// Create a client for the configured API
    pub fn new(config: &ApiConfig, store: Arc<dyn SessionStore>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            store,
            logger: get_logger("amber"),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let session = self.store.load()?;
        let Some(api_key) = session.api_key() else {
            return Err(MonitorError::MissingCredential);
        };

        let url = format!("{}{}", self.base_url, endpoint);
        self.logger.debug(&format!("GET {} {:?}", endpoint, query));

        let resp = self
            .http
            .get(&url)
            .query(query)
            .header(AUTHORIZATION, format!("Bearer {}", api_key.trim()))
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, concat!("amber-monitor/", env!("APP_VERSION")))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(self.status_error(status, resp.headers()));
        }

        Ok(resp.json::<T>().await?)
    }

    fn status_error(&self, status: StatusCode, headers: &HeaderMap) -> MonitorError {
        match status {
            StatusCode::UNAUTHORIZED => {
                self.logger.error("Amber API rejected the API key");
                MonitorError::InvalidCredential
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
                let wait = rate_limit::wait_seconds(
                    header(RETRY_AFTER.as_str()),
                    header(RATE_LIMIT_RESET_HEADER),
                    Utc::now(),
                );
                self.logger
                    .warn(&format!("Amber API rate limit hit; retry in {}s", wait));
                MonitorError::rate_limited(wait)
            }
            other => {
                self.logger.error(&format!("Amber API error: {}", other));
                MonitorError::api(other.as_u16())
            }
        }
    }
}

fn date_range_query(start_date: NaiveDate, end_date: NaiveDate) -> Vec<(&'static str, String)> {
    vec![
        ("startDate", start_date.format(DATE_FORMAT).to_string()),
        ("endDate", end_date.format(DATE_FORMAT).to_string()),
    ]
}

#[async_trait::async_trait]
impl PricingApi for AmberClient {
    async fn get_sites(&self) -> Result<Vec<Site>> {
        self.get_json("/sites", &[]).await
    }

    async fn get_usage(
        &self,
        site_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<UsageInterval>> {
        let query = date_range_query(start_date, end_date);
        self.get_json(&format!("/sites/{}/usage", site_id), &query)
            .await
    }

    async fn get_prices(
        &self,
        site_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        resolution: u32,
    ) -> Result<Vec<PriceInterval>> {
        let mut query = date_range_query(start_date, end_date);
        query.push(("resolution", resolution.to_string()));
        self.get_json(&format!("/sites/{}/prices", site_id), &query)
            .await
    }

    async fn get_current_prices(
        &self,
        site_id: &str,
        options: CurrentPriceOptions,
    ) -> Result<Vec<PriceInterval>> {
        self.get_json(
            &format!("/sites/{}/prices/current", site_id),
            &options.query_pairs(),
        )
        .await
    }
}
