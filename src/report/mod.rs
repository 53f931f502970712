//! Usage and price aggregation
//!
//! Turns raw API intervals into the series the views show: a trailing
//! overview of daily statistics, a single-day detail joined with prices, a
//! live window of recent usage, and the current price outlook.
//!
//! Only `general` channel rows count toward consumption and cost; `feedIn`
//! rows only feed the export figure.

pub mod chunks;
pub mod detail;
pub mod live;
pub mod overview;
pub mod prices;

pub use chunks::{DateChunk, chunk_trailing_window, window_dates};
pub use detail::{DetailPoint, DetailReport, build_detail, fetch_detail};
pub use live::{LivePoint, LiveRange, LiveReport, LiveStats, build_live, fetch_live};
pub use overview::{OverviewReport, RangeTotals, aggregate_overview, fetch_overview};
pub use prices::{PriceOutlook, build_outlook, fetch_outlook};

use crate::amber::{ChannelType, PriceInterval, UsageInterval};
use crate::config::{Config, ViewerZone};
use crate::error::Result;
use chrono::NaiveDate;
use serde::Serialize;

/// Settings shared by every report
#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    pub overview_days: u32,
    pub max_chunk_days: u32,
    pub resolution_minutes: u32,
    pub zone: ViewerZone,
}

impl ReportOptions {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            overview_days: config.report.overview_days,
            max_chunk_days: config.report.max_chunk_days,
            resolution_minutes: config.api.resolution_minutes,
            zone: config.viewer_zone()?,
        })
    }
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            overview_days: 30,
            max_chunk_days: 7,
            resolution_minutes: 30,
            zone: ViewerZone::Local,
        }
    }
}

/// Statistics for one calendar date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyStat {
    pub date: NaiveDate,
    pub total_usage_kwh: f64,
    /// Absolute value of the feed-in sum
    pub solar_export_kwh: f64,
    pub total_cost_cents: f64,
    /// Mean renewables over general price rows, 0 when there are none
    pub avg_renewables_pct: f64,
}

impl DailyStat {
    /// A date without data
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total_usage_kwh: 0.0,
            solar_export_kwh: 0.0,
            total_cost_cents: 0.0,
            avg_renewables_pct: 0.0,
        }
    }

    /// Fold rows already attributed to `date`; channels are filtered here
    pub fn from_rows<'a, U, P>(date: NaiveDate, usage: U, prices: P) -> Self
    where
        U: IntoIterator<Item = &'a UsageInterval>,
        P: IntoIterator<Item = &'a PriceInterval>,
    {
        let mut stat = Self::empty(date);
        let mut feed_in = 0.0;
        for row in usage {
            match row.channel_type {
                ChannelType::General => {
                    stat.total_usage_kwh += row.kwh;
                    stat.total_cost_cents += row.cost;
                }
                ChannelType::FeedIn => feed_in += row.kwh,
                ChannelType::ControlledLoad | ChannelType::Unknown => {}
            }
        }
        stat.solar_export_kwh = f64::abs(feed_in);

        let (sum, count) = prices
            .into_iter()
            .filter(|p| p.channel_type == ChannelType::General)
            .fold((0.0, 0usize), |(sum, n), p| (sum + p.renewables, n + 1));
        stat.avg_renewables_pct = mean(sum, count);
        stat
    }
}

/// `sum / count`, or 0 for an empty set
pub(crate) fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { sum / count as f64 }
}
