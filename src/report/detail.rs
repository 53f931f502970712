//! Single-day detail: one point per general usage interval, joined with the
//! general price interval that starts at the same instant.

use super::{DailyStat, ReportOptions};
use crate::amber::{ChannelType, PriceInterval, PricingApi, UsageInterval};
use crate::config::ViewerZone;
use crate::error::Result;
use crate::logging::{LogContext, get_logger_with_context};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailPoint {
    pub start_time: DateTime<Utc>,
    /// HH:MM in the viewer's zone
    pub time: String,
    pub usage_kwh: f64,
    pub cost_cents: f64,
    /// c/kWh, 0 when no price row matched
    pub price_cents_per_kwh: f64,
    /// 0 when no price row matched
    pub renewables_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailReport {
    pub date: NaiveDate,
    pub points: Vec<DetailPoint>,
    pub totals: DailyStat,
}

/// Build the chart points and day totals from one day's rows
pub fn build_detail(
    date: NaiveDate,
    usage: &[UsageInterval],
    prices: &[PriceInterval],
    zone: ViewerZone,
) -> DetailReport {
    // First match wins when the API repeats a start time
    let mut price_at: HashMap<DateTime<Utc>, &PriceInterval> = HashMap::new();
    for p in prices
        .iter()
        .filter(|p| p.channel_type == ChannelType::General)
    {
        price_at.entry(p.start_time).or_insert(p);
    }

    let mut general: Vec<&UsageInterval> = usage
        .iter()
        .filter(|u| u.channel_type == ChannelType::General)
        .collect();
    general.sort_by_key(|u| u.start_time);

    let points = general
        .into_iter()
        .map(|u| {
            let matched = price_at.get(&u.start_time);
            DetailPoint {
                start_time: u.start_time,
                time: zone.time_label(u.start_time),
                usage_kwh: u.kwh,
                cost_cents: u.cost,
                price_cents_per_kwh: matched.map_or(0.0, |p| p.per_kwh),
                renewables_pct: matched.map_or(0.0, |p| p.renewables),
            }
        })
        .collect();

    DetailReport {
        date,
        points,
        totals: DailyStat::from_rows(date, usage, prices),
    }
}

/// Fetch usage and prices for exactly one date
pub async fn fetch_detail(
    api: &dyn PricingApi,
    site_id: &str,
    date: NaiveDate,
    options: &ReportOptions,
) -> Result<DetailReport> {
    let logger = get_logger_with_context(
        LogContext::new("report")
            .with_site_id(site_id)
            .with_field("date", date.to_string()),
    );
    let (usage, prices) = futures::try_join!(
        api.get_usage(site_id, date, date),
        api.get_prices(site_id, date, date, options.resolution_minutes),
    )?;

    let report = build_detail(date, &usage, &prices, options.zone);
    logger.info(&format!(
        "Detail: {} points, {:.2} kWh",
        report.points.len(),
        report.totals.total_usage_kwh
    ));
    Ok(report)
}
