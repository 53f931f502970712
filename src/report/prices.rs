//! Current price outlook from the `prices/current` endpoint

use crate::amber::{ChannelType, CurrentPriceOptions, IntervalKind, PriceInterval, PricingApi};
use crate::error::Result;
use crate::logging::{LogContext, get_logger_with_context};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceOutlook {
    pub generated_at: DateTime<Utc>,
    /// General price in force now
    pub current: Option<PriceInterval>,
    /// Feed-in price in force now
    pub feed_in: Option<PriceInterval>,
    /// General intervals before the current one, oldest first
    pub previous: Vec<PriceInterval>,
    /// General intervals after the current one, oldest first
    pub upcoming: Vec<PriceInterval>,
    pub cheapest_upcoming: Option<PriceInterval>,
    pub priciest_upcoming: Option<PriceInterval>,
}

fn current_of<'a>(
    rows: &[&'a PriceInterval],
    now: DateTime<Utc>,
) -> Option<&'a PriceInterval> {
    rows.iter()
        .copied()
        .find(|p| p.kind == Some(IntervalKind::CurrentInterval))
        .or_else(|| rows.iter().copied().rev().find(|p| p.start_time <= now))
}

/// Split rows around the current interval and pick the extremes ahead
pub fn build_outlook(rows: &[PriceInterval], now: DateTime<Utc>) -> PriceOutlook {
    let mut general: Vec<&PriceInterval> = rows
        .iter()
        .filter(|p| p.channel_type == ChannelType::General)
        .collect();
    general.sort_by_key(|p| p.start_time);
    let mut feed_in: Vec<&PriceInterval> = rows
        .iter()
        .filter(|p| p.channel_type == ChannelType::FeedIn)
        .collect();
    feed_in.sort_by_key(|p| p.start_time);

    let current = current_of(&general, now);
    let pivot = current.map_or(now, |c| c.start_time);

    let previous: Vec<PriceInterval> = general
        .iter()
        .filter(|p| p.start_time < pivot)
        .map(|p| (*p).clone())
        .collect();
    let upcoming: Vec<PriceInterval> = general
        .iter()
        .filter(|p| p.start_time > pivot)
        .map(|p| (*p).clone())
        .collect();

    let by_price = |a: &&PriceInterval, b: &&PriceInterval| a.per_kwh.total_cmp(&b.per_kwh);
    let cheapest_upcoming = upcoming.iter().min_by(by_price).cloned();
    let priciest_upcoming = upcoming.iter().max_by(by_price).cloned();

    PriceOutlook {
        generated_at: now,
        current: current.cloned(),
        feed_in: current_of(&feed_in, now).cloned(),
        previous,
        upcoming,
        cheapest_upcoming,
        priciest_upcoming,
    }
}

pub async fn fetch_outlook(
    api: &dyn PricingApi,
    site_id: &str,
    options: CurrentPriceOptions,
    now: DateTime<Utc>,
) -> Result<PriceOutlook> {
    let logger = get_logger_with_context(LogContext::new("report").with_site_id(site_id));
    let rows = api.get_current_prices(site_id, options).await?;
    let outlook = build_outlook(&rows, now);
    logger.debug(&format!(
        "Price outlook: {} rows, {} upcoming",
        rows.len(),
        outlook.upcoming.len()
    ));
    Ok(outlook)
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;

    fn with_kind(mut p: PriceInterval, kind: IntervalKind) -> PriceInterval {
        p.kind = Some(kind);
        p
    }

    #[test]
    fn splits_around_current_interval() {
        let rows = vec![
            with_kind(
                price("2024-06-10T09:00:00Z", ChannelType::General, 40.0, 20.0),
                IntervalKind::ForecastInterval,
            ),
            with_kind(
                price("2024-06-10T08:00:00Z", ChannelType::General, 30.0, 25.0),
                IntervalKind::ActualInterval,
            ),
            with_kind(
                price("2024-06-10T08:30:00Z", ChannelType::General, 35.0, 22.0),
                IntervalKind::CurrentInterval,
            ),
            with_kind(
                price("2024-06-10T09:30:00Z", ChannelType::General, 18.0, 60.0),
                IntervalKind::ForecastInterval,
            ),
            with_kind(
                price("2024-06-10T08:30:00Z", ChannelType::FeedIn, -6.0, 22.0),
                IntervalKind::CurrentInterval,
            ),
        ];
        let outlook = build_outlook(&rows, ts("2024-06-10T08:40:00Z"));
        assert_eq!(outlook.current.as_ref().map(|p| p.per_kwh), Some(35.0));
        assert_eq!(outlook.feed_in.as_ref().map(|p| p.per_kwh), Some(-6.0));
        assert_eq!(outlook.previous.len(), 1);
        assert_eq!(outlook.upcoming.len(), 2);
        assert_eq!(
            outlook.cheapest_upcoming.as_ref().map(|p| p.per_kwh),
            Some(18.0)
        );
        assert_eq!(
            outlook.priciest_upcoming.as_ref().map(|p| p.per_kwh),
            Some(40.0)
        );
    }

    #[test]
    fn falls_back_to_latest_started_interval() {
        let rows = vec![
            price("2024-06-10T08:00:00Z", ChannelType::General, 30.0, 25.0),
            price("2024-06-10T08:30:00Z", ChannelType::General, 31.0, 25.0),
            price("2024-06-10T09:00:00Z", ChannelType::General, 32.0, 25.0),
        ];
        let outlook = build_outlook(&rows, ts("2024-06-10T08:45:00Z"));
        assert_eq!(outlook.current.as_ref().map(|p| p.per_kwh), Some(31.0));
        assert_eq!(outlook.upcoming.len(), 1);
        assert!(outlook.feed_in.is_none());
    }

    #[test]
    fn empty_rows() {
        let outlook = build_outlook(&[], ts("2024-06-10T08:45:00Z"));
        assert!(outlook.current.is_none());
        assert!(outlook.cheapest_upcoming.is_none());
    }
}
