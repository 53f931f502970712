//! Recent usage for the live view
//!
//! The API only accepts whole dates, so the request covers every date the
//! window touches and rows outside the window are dropped afterwards.

use super::{ReportOptions, mean};
use crate::amber::{ChannelType, PricingApi, UsageInterval};
use crate::config::ViewerZone;
use crate::error::{MonitorError, Result};
use crate::logging::{LogContext, get_logger_with_context};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Selectable live window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveRange {
    #[serde(rename = "6h")]
    SixHours,
    #[serde(rename = "12h")]
    TwelveHours,
    #[serde(rename = "24h")]
    TwentyFourHours,
    Today,
}

impl LiveRange {
    pub const ALL: [LiveRange; 4] = [
        Self::SixHours,
        Self::TwelveHours,
        Self::TwentyFourHours,
        Self::Today,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SixHours => "6h",
            Self::TwelveHours => "12h",
            Self::TwentyFourHours => "24h",
            Self::Today => "today",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::SixHours => "Last 6 Hours",
            Self::TwelveHours => "Last 12 Hours",
            Self::TwentyFourHours => "Last 24 Hours",
            Self::Today => "Today",
        }
    }

    /// Trailing hours, `None` for the calendar-day range
    pub fn hours(&self) -> Option<i64> {
        match self {
            Self::SixHours => Some(6),
            Self::TwelveHours => Some(12),
            Self::TwentyFourHours => Some(24),
            Self::Today => None,
        }
    }

    /// Dates to request for a window ending at `now`
    pub fn query_dates(&self, now: DateTime<Utc>, zone: ViewerZone) -> (NaiveDate, NaiveDate) {
        let end = zone.date_of(now);
        let start = match self.hours() {
            Some(h) => zone.date_of(now - Duration::hours(h)),
            None => end,
        };
        (start, end)
    }

    /// Whether an interval start falls in the window ending at `now`
    pub fn contains(&self, start: DateTime<Utc>, now: DateTime<Utc>, zone: ViewerZone) -> bool {
        if start > now {
            return false;
        }
        match self.hours() {
            Some(h) => start >= now - Duration::hours(h),
            None => zone.date_of(start) == zone.date_of(now),
        }
    }
}

impl fmt::Display for LiveRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LiveRange {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                MonitorError::validation("range", "Expected one of 6h, 12h, 24h, today")
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LivePoint {
    pub start_time: DateTime<Utc>,
    pub time: String,
    pub usage_kwh: f64,
    pub cost_cents: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveStats {
    /// Usage of the most recent interval
    pub current_usage_kwh: f64,
    pub avg_usage_kwh: f64,
    pub total_usage_kwh: f64,
    pub estimated_cost_cents: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveReport {
    pub range: LiveRange,
    pub generated_at: DateTime<Utc>,
    pub points: Vec<LivePoint>,
    pub stats: LiveStats,
}

/// General usage inside the window, oldest first
pub fn build_live(
    range: LiveRange,
    now: DateTime<Utc>,
    usage: &[UsageInterval],
    zone: ViewerZone,
) -> LiveReport {
    let mut rows: Vec<&UsageInterval> = usage
        .iter()
        .filter(|u| u.channel_type == ChannelType::General)
        .filter(|u| range.contains(u.start_time, now, zone))
        .collect();
    rows.sort_by_key(|u| u.start_time);

    let total_usage_kwh: f64 = rows.iter().map(|u| u.kwh).sum();
    let stats = LiveStats {
        current_usage_kwh: rows.last().map_or(0.0, |u| u.kwh),
        avg_usage_kwh: mean(total_usage_kwh, rows.len()),
        total_usage_kwh,
        estimated_cost_cents: rows.iter().map(|u| u.cost).sum(),
    };

    let points = rows
        .into_iter()
        .map(|u| LivePoint {
            start_time: u.start_time,
            time: zone.time_label(u.start_time),
            usage_kwh: u.kwh,
            cost_cents: u.cost,
        })
        .collect();

    LiveReport {
        range,
        generated_at: now,
        points,
        stats,
    }
}

/// Fetch usage covering the window and reduce it to the live report
pub async fn fetch_live(
    api: &dyn PricingApi,
    site_id: &str,
    range: LiveRange,
    now: DateTime<Utc>,
    options: &ReportOptions,
) -> Result<LiveReport> {
    let logger = get_logger_with_context(
        LogContext::new("report")
            .with_site_id(site_id)
            .with_field("range", range.to_string()),
    );
    let (start, end) = range.query_dates(now, options.zone);
    let usage = api.get_usage(site_id, start, end).await?;
    let report = build_live(range, now, &usage, options.zone);
    logger.debug(&format!(
        "Live {}..{}: {} rows returned, {} in window",
        start,
        end,
        usage.len(),
        report.points.len()
    ));
    Ok(report)
}
