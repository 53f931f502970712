#![allow(dead_code)]

use amber_monitor::amber::{
    AmberClient, ChannelType, CurrentPriceOptions, PriceDescriptor, PriceInterval, PricingApi,
    Site, SiteStatus, UsageInterval,
};
use amber_monitor::config::ApiConfig;
use amber_monitor::error::{MonitorError, Result};
use amber_monitor::store::{MemorySessionStore, Session, SessionStore};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

pub const SITE_ID: &str = "01F5A5CRKMZ5BCX9P1S4V990AM";

pub fn logged_in_store() -> Arc<MemorySessionStore> {
    Arc::new(MemorySessionStore::with_session(Session {
        api_key: Some("psk_test".into()),
        site_id: Some(SITE_ID.into()),
        auth_token: Some("token".into()),
    }))
}

pub fn client_for(base_url: &str, store: Arc<dyn SessionStore>) -> AmberClient {
    let config = ApiConfig {
        base_url: base_url.to_string(),
        ..ApiConfig::default()
    };
    AmberClient::new(&config, store).unwrap()
}

pub fn ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

pub fn usage_row(at: &str, channel: ChannelType, kwh: f64, cost: f64) -> UsageInterval {
    UsageInterval {
        start_time: ts(at),
        channel_type: channel,
        kwh,
        cost,
        channel_identifier: None,
    }
}

pub fn price_row(at: &str, per_kwh: f64, renewables: f64) -> PriceInterval {
    PriceInterval {
        start_time: ts(at),
        channel_type: ChannelType::General,
        per_kwh,
        spot_per_kwh: per_kwh / 2.0,
        renewables,
        descriptor: PriceDescriptor::Neutral,
        kind: None,
    }
}

pub fn site(id: &str, status: SiteStatus) -> Site {
    Site {
        id: id.to_string(),
        status,
        nmi: None,
        network: None,
        active_from: None,
        interval_length: Some(30),
    }
}

/// Recorded `get_usage` call
#[derive(Debug, Clone, PartialEq)]
pub struct UsageCall {
    pub site_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Scripted in-process API
#[derive(Default)]
pub struct FakeApi {
    pub sites: Vec<Site>,
    pub usage: Vec<UsageInterval>,
    pub prices: Vec<PriceInterval>,
    /// Errors handed out, in order, by the next usage calls
    usage_errors: Mutex<VecDeque<MonitorError>>,
    /// Usage calls starting on this date fail with HTTP 500
    failing_start: Mutex<Option<NaiveDate>>,
    /// The next usage call waits for this before answering
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    pub usage_calls: Mutex<Vec<UsageCall>>,
    pub price_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_usage_error(&self, err: MonitorError) {
        self.usage_errors.lock().unwrap().push_back(err);
    }

    pub fn fail_usage_starting(&self, date: NaiveDate) {
        *self.failing_start.lock().unwrap() = Some(date);
    }

    /// Hold the next usage call until the returned sender fires
    pub fn hold_next_usage(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn usage_call_count(&self) -> usize {
        self.usage_calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl PricingApi for FakeApi {
    async fn get_sites(&self) -> Result<Vec<Site>> {
        Ok(self.sites.clone())
    }

    async fn get_usage(
        &self,
        site_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<UsageInterval>> {
        self.usage_calls.lock().unwrap().push(UsageCall {
            site_id: site_id.to_string(),
            start_date,
            end_date,
        });
        let gate = self.gate.lock().unwrap().take();
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        match gate {
            Some(rx) => {
                let _ = rx.await;
            }
            None => tokio::task::yield_now().await,
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(err) = self.usage_errors.lock().unwrap().pop_front() {
            return Err(err);
        }
        if *self.failing_start.lock().unwrap() == Some(start_date) {
            return Err(MonitorError::api(500));
        }
        Ok(self
            .usage
            .iter()
            .filter(|u| {
                let date = u.start_time.date_naive();
                date >= start_date && date <= end_date
            })
            .cloned()
            .collect())
    }

    async fn get_prices(
        &self,
        _site_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        _resolution: u32,
    ) -> Result<Vec<PriceInterval>> {
        self.price_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .prices
            .iter()
            .filter(|p| {
                let date = p.start_time.date_naive();
                date >= start_date && date <= end_date
            })
            .cloned()
            .collect())
    }

    async fn get_current_prices(
        &self,
        _site_id: &str,
        _options: CurrentPriceOptions,
    ) -> Result<Vec<PriceInterval>> {
        Ok(self.prices.clone())
    }
}
