//! Trailing multi-day overview
//!
//! The window is fetched in chunks of at most `max_chunk_days` because the
//! API rejects wider requests. All chunk requests run concurrently and the
//! whole report fails if any one of them fails. Every date of the window is
//! present in the result; dates without rows are zero-filled.

use super::{DailyStat, ReportOptions, chunk_trailing_window, mean, window_dates};
use crate::amber::{ChannelType, PriceInterval, PricingApi, UsageInterval};
use crate::config::ViewerZone;
use crate::error::Result;
use crate::logging::{LogContext, get_logger_with_context};
use chrono::NaiveDate;
use futures::future::try_join_all;
use serde::Serialize;
use std::collections::HashMap;

/// Totals across the whole window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeTotals {
    pub total_usage_kwh: f64,
    pub total_solar_export_kwh: f64,
    pub total_cost_cents: f64,
    /// Cost per kWh in cents; 0 when nothing was consumed
    pub avg_price_cents_per_kwh: f64,
    /// Mean of the daily renewables averages
    pub avg_renewables_pct: f64,
}

impl RangeTotals {
    pub fn from_days(days: &[DailyStat]) -> Self {
        let total_usage_kwh: f64 = days.iter().map(|d| d.total_usage_kwh).sum();
        let total_cost_cents: f64 = days.iter().map(|d| d.total_cost_cents).sum();
        let renewables: f64 = days.iter().map(|d| d.avg_renewables_pct).sum();
        Self {
            total_usage_kwh,
            total_solar_export_kwh: days.iter().map(|d| d.solar_export_kwh).sum(),
            total_cost_cents,
            avg_price_cents_per_kwh: if total_usage_kwh > 0.0 {
                total_cost_cents / total_usage_kwh
            } else {
                0.0
            },
            avg_renewables_pct: mean(renewables, days.len()),
        }
    }
}

/// Daily statistics for a trailing window, oldest first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: Vec<DailyStat>,
    pub totals: RangeTotals,
}

#[derive(Default)]
struct UsageBucket<'a> {
    general: Vec<&'a UsageInterval>,
    feed_in: Vec<&'a UsageInterval>,
}

/// Group rows by viewer date and fold them into one stat per window date
pub fn aggregate_overview(
    dates: &[NaiveDate],
    usage: &[UsageInterval],
    prices: &[PriceInterval],
    zone: ViewerZone,
) -> OverviewReport {
    let mut usage_by_date: HashMap<NaiveDate, UsageBucket<'_>> = HashMap::new();
    for row in usage {
        let bucket = usage_by_date.entry(zone.date_of(row.start_time)).or_default();
        match row.channel_type {
            ChannelType::General => bucket.general.push(row),
            ChannelType::FeedIn => bucket.feed_in.push(row),
            ChannelType::ControlledLoad | ChannelType::Unknown => {}
        }
    }

    let mut prices_by_date: HashMap<NaiveDate, Vec<&PriceInterval>> = HashMap::new();
    for row in prices
        .iter()
        .filter(|p| p.channel_type == ChannelType::General)
    {
        prices_by_date
            .entry(zone.date_of(row.start_time))
            .or_default()
            .push(row);
    }

    let days: Vec<DailyStat> = dates
        .iter()
        .map(|date| {
            let day_prices = prices_by_date.get(date).map(Vec::as_slice).unwrap_or(&[]);
            match usage_by_date.get(date) {
                Some(bucket) => DailyStat::from_rows(
                    *date,
                    bucket.general.iter().chain(bucket.feed_in.iter()).copied(),
                    day_prices.iter().copied(),
                ),
                None => DailyStat::from_rows(*date, [], day_prices.iter().copied()),
            }
        })
        .collect();

    OverviewReport {
        start_date: dates.first().copied().unwrap_or_default(),
        end_date: dates.last().copied().unwrap_or_default(),
        totals: RangeTotals::from_days(&days),
        days,
    }
}

/// Fetch and aggregate the trailing window ending at `today`
pub async fn fetch_overview(
    api: &dyn PricingApi,
    site_id: &str,
    today: NaiveDate,
    options: &ReportOptions,
) -> Result<OverviewReport> {
    let logger = get_logger_with_context(LogContext::new("report").with_site_id(site_id));
    let chunks = chunk_trailing_window(today, options.overview_days, options.max_chunk_days);
    logger.debug(&format!(
        "Fetching {} day overview in {} chunks",
        options.overview_days,
        chunks.len()
    ));

    let requests = chunks.iter().map(|chunk| async move {
        futures::try_join!(
            api.get_usage(site_id, chunk.start_date, chunk.end_date),
            api.get_prices(
                site_id,
                chunk.start_date,
                chunk.end_date,
                options.resolution_minutes
            ),
        )
    });
    let results = try_join_all(requests).await?;

    let mut usage = Vec::new();
    let mut prices = Vec::new();
    for (chunk_usage, chunk_prices) in results {
        usage.extend(chunk_usage);
        prices.extend(chunk_prices);
    }

    let dates = window_dates(today, options.overview_days);
    let report = aggregate_overview(&dates, &usage, &prices, options.zone);
    logger.info(&format!(
        "Overview {}..{}: {} usage rows, {} price rows, {:.2} kWh",
        report.start_date,
        report.end_date,
        usage.len(),
        prices.len(),
        report.totals.total_usage_kwh
    ));
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;

    fn zone() -> ViewerZone {
        ViewerZone::parse("UTC").unwrap()
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn one_day_with_general_and_feed_in() {
        let dates = vec![d("2024-06-09"), d("2024-06-10")];
        let usage = vec![
            usage("2024-06-10T03:00:00Z", ChannelType::General, 5.0, 100.0),
            usage("2024-06-10T03:00:00Z", ChannelType::FeedIn, -2.0, 0.0),
        ];
        let report = aggregate_overview(&dates, &usage, &[], zone());
        let day = &report.days[1];
        assert_eq!(day.date, d("2024-06-10"));
        assert_eq!(day.total_usage_kwh, 5.0);
        assert_eq!(day.solar_export_kwh, 2.0);
        assert_eq!(day.total_cost_cents, 100.0);
    }

    #[test]
    fn dates_without_rows_are_zero_filled() {
        let dates = vec![d("2024-06-08"), d("2024-06-09"), d("2024-06-10")];
        let usage = vec![usage(
            "2024-06-10T03:00:00Z",
            ChannelType::General,
            1.0,
            30.0,
        )];
        let report = aggregate_overview(&dates, &usage, &[], zone());
        assert_eq!(report.days.len(), 3);
        assert_eq!(report.days[0], DailyStat::empty(d("2024-06-08")));
        assert_eq!(report.days[1], DailyStat::empty(d("2024-06-09")));
        assert_eq!(report.start_date, d("2024-06-08"));
        assert_eq!(report.end_date, d("2024-06-10"));
    }

    #[test]
    fn zero_usage_gives_zero_average_price() {
        let dates = vec![d("2024-06-10")];
        let report = aggregate_overview(&dates, &[], &[], zone());
        assert_eq!(report.totals.total_usage_kwh, 0.0);
        assert_eq!(report.totals.avg_price_cents_per_kwh, 0.0);
        assert!(!report.totals.avg_price_cents_per_kwh.is_nan());
    }

    #[test]
    fn totals_average_daily_renewables() {
        let dates = vec![d("2024-06-09"), d("2024-06-10")];
        let usage = vec![
            usage("2024-06-09T01:00:00Z", ChannelType::General, 2.0, 50.0),
            usage("2024-06-10T01:00:00Z", ChannelType::General, 3.0, 100.0),
        ];
        let prices = vec![
            price("2024-06-09T01:00:00Z", ChannelType::General, 25.0, 30.0),
            price("2024-06-09T01:30:00Z", ChannelType::General, 25.0, 50.0),
            price("2024-06-10T01:00:00Z", ChannelType::FeedIn, -3.0, 90.0),
        ];
        let report = aggregate_overview(&dates, &usage, &prices, zone());
        assert_eq!(report.days[0].avg_renewables_pct, 40.0);
        assert_eq!(report.days[1].avg_renewables_pct, 0.0);
        assert_eq!(report.totals.avg_renewables_pct, 20.0);
        assert_eq!(report.totals.total_usage_kwh, 5.0);
        assert_eq!(report.totals.total_cost_cents, 150.0);
        assert_eq!(report.totals.avg_price_cents_per_kwh, 30.0);
    }

    #[test]
    fn rows_are_grouped_by_viewer_date() {
        // 15:00 UTC on the 9th is already the 10th in Sydney
        let sydney = ViewerZone::parse("Australia/Sydney").unwrap();
        let dates = vec![d("2024-06-09"), d("2024-06-10")];
        let usage = vec![usage(
            "2024-06-09T15:00:00Z",
            ChannelType::General,
            4.0,
            80.0,
        )];
        let report = aggregate_overview(&dates, &usage, &[], sydney);
        assert_eq!(report.days[0].total_usage_kwh, 0.0);
        assert_eq!(report.days[1].total_usage_kwh, 4.0);
    }

    #[test]
    fn rows_outside_the_window_are_ignored() {
        let dates = vec![d("2024-06-10")];
        let usage = vec![usage(
            "2024-05-01T01:00:00Z",
            ChannelType::General,
            9.0,
            9.0,
        )];
        let report = aggregate_overview(&dates, &usage, &[], zone());
        assert_eq!(report.totals.total_usage_kwh, 0.0);
    }
}
