//! Amber Electric API integration
//!
//! Authenticated REST calls for sites, usage and prices. The
//! [`PricingApi`] trait is the seam the report engine talks to, so reports
//! can be exercised against a fake backend.

pub mod client;
pub mod rate_limit;
pub mod types;

pub use client::AmberClient;
pub use types::{
    ChannelType, CurrentPriceOptions, IntervalKind, PriceDescriptor, PriceInterval, Site,
    SiteStatus, UsageInterval,
};

use crate::error::Result;
use chrono::NaiveDate;

/// Date format used by every date query parameter
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Operations offered by the pricing/usage API
#[async_trait::async_trait]
pub trait PricingApi: Send + Sync {
    /// Sites belonging to the account
    async fn get_sites(&self) -> Result<Vec<Site>>;

    /// Usage intervals between two dates, both inclusive
    async fn get_usage(
        &self,
        site_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<UsageInterval>>;

    /// Price intervals between two dates, both inclusive
    async fn get_prices(
        &self,
        site_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        resolution: u32,
    ) -> Result<Vec<PriceInterval>>;

    /// Price intervals centered on now
    async fn get_current_prices(
        &self,
        site_id: &str,
        options: CurrentPriceOptions,
    ) -> Result<Vec<PriceInterval>>;
}
