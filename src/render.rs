//! Plain-text presentation of reports for the terminal

use crate::amber::{PriceInterval, Site};
use crate::config::ViewerZone;
use crate::dashboard::{Report, ViewState};
use crate::report::{DetailReport, LiveReport, OverviewReport, PriceOutlook};
use crate::retry::RetryState;
use std::fmt::Write;

/// Cents as a dollar amount with two decimals
pub fn dollars(cents: f64) -> String {
    format!("${:.2}", cents / 100.0)
}

/// Banner suffix while a rate-limit countdown runs
pub fn countdown_text(seconds: u64) -> String {
    let unit = if seconds == 1 { "second" } else { "seconds" };
    format!("Retrying automatically in {} {}...", seconds, unit)
}

pub fn render_overview(report: &OverviewReport) -> String {
    let mut out = String::new();
    let totals = &report.totals;
    let _ = writeln!(
        out,
        "Daily Usage Report (Last {} Days)  {} to {}",
        report.days.len(),
        report.start_date,
        report.end_date
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "  Total Usage     {:.2} kWh", totals.total_usage_kwh);
    let _ = writeln!(out, "  Total Cost      {}", dollars(totals.total_cost_cents));
    let _ = writeln!(
        out,
        "  Solar Exports   {:.2} kWh",
        totals.total_solar_export_kwh
    );
    let _ = writeln!(
        out,
        "  Avg Price       {:.2} c/kWh",
        totals.avg_price_cents_per_kwh
    );
    let _ = writeln!(out, "  Avg Renewables  {:.1}%", totals.avg_renewables_pct);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<12} {:>10} {:>10} {:>10} {:>11}",
        "Date", "Usage kWh", "Export kWh", "Cost", "Renewables"
    );
    for day in &report.days {
        let _ = writeln!(
            out,
            "{:<12} {:>10.2} {:>10.2} {:>10} {:>10.1}%",
            day.date.format("%Y-%m-%d").to_string(),
            day.total_usage_kwh,
            day.solar_export_kwh,
            dollars(day.total_cost_cents),
            day.avg_renewables_pct
        );
    }
    out
}

pub fn render_detail(report: &DetailReport) -> String {
    let mut out = String::new();
    let totals = &report.totals;
    let _ = writeln!(out, "Usage for {}", report.date.format("%B %d, %Y"));
    let _ = writeln!(out);
    let _ = writeln!(out, "  Total Usage     {:.2} kWh", totals.total_usage_kwh);
    let _ = writeln!(out, "  Total Cost      {}", dollars(totals.total_cost_cents));
    let _ = writeln!(out, "  Solar Exports   {:.2} kWh", totals.solar_export_kwh);
    let _ = writeln!(out, "  Avg Renewables  {:.1}%", totals.avg_renewables_pct);
    let _ = writeln!(out);
    if report.points.is_empty() {
        let _ = writeln!(out, "No usage recorded for this date.");
        return out;
    }
    let _ = writeln!(
        out,
        "{:<6} {:>9} {:>10} {:>12} {:>11}",
        "Time", "Usage kWh", "Cost c", "Price c/kWh", "Renewables"
    );
    for point in &report.points {
        let _ = writeln!(
            out,
            "{:<6} {:>9.3} {:>10.2} {:>12.2} {:>10.1}%",
            point.time,
            point.usage_kwh,
            point.cost_cents,
            point.price_cents_per_kwh,
            point.renewables_pct
        );
    }
    out
}

pub fn render_live(report: &LiveReport) -> String {
    let mut out = String::new();
    let stats = &report.stats;
    let _ = writeln!(out, "Live Usage ({})", report.range.label());
    let _ = writeln!(out);
    let _ = writeln!(out, "  Current         {:.3} kWh", stats.current_usage_kwh);
    let _ = writeln!(out, "  Average         {:.3} kWh", stats.avg_usage_kwh);
    let _ = writeln!(out, "  Total           {:.2} kWh", stats.total_usage_kwh);
    let _ = writeln!(
        out,
        "  Estimated Cost  {}",
        dollars(stats.estimated_cost_cents)
    );
    let _ = writeln!(out);
    if report.points.is_empty() {
        let _ = writeln!(out, "No usage in this window yet.");
        return out;
    }
    let _ = writeln!(out, "{:<6} {:>9} {:>10}", "Time", "Usage kWh", "Cost c");
    for point in &report.points {
        let _ = writeln!(
            out,
            "{:<6} {:>9.3} {:>10.2}",
            point.time, point.usage_kwh, point.cost_cents
        );
    }
    out
}

fn price_line(label: &str, interval: &PriceInterval, zone: ViewerZone) -> String {
    format!(
        "  {:<16}{} {:>7.2} c/kWh  spot {:>6.2}  {:>5.1}% renewable  {}",
        label,
        zone.time_label(interval.start_time),
        interval.per_kwh,
        interval.spot_per_kwh,
        interval.renewables,
        interval.descriptor.as_str()
    )
}

pub fn render_outlook(outlook: &PriceOutlook, zone: ViewerZone) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Current Prices");
    let _ = writeln!(out);
    match &outlook.current {
        Some(current) => {
            let _ = writeln!(out, "{}", price_line("General", current, zone));
        }
        None => {
            let _ = writeln!(out, "  No current general price available.");
        }
    }
    if let Some(feed_in) = &outlook.feed_in {
        let _ = writeln!(out, "{}", price_line("Feed-in", feed_in, zone));
    }
    if let Some(cheapest) = &outlook.cheapest_upcoming {
        let _ = writeln!(out, "{}", price_line("Cheapest ahead", cheapest, zone));
    }
    if let Some(priciest) = &outlook.priciest_upcoming {
        let _ = writeln!(out, "{}", price_line("Priciest ahead", priciest, zone));
    }
    if !outlook.upcoming.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{:<6} {:>9} {:>11}", "Time", "c/kWh", "Descriptor");
        for interval in &outlook.upcoming {
            let _ = writeln!(
                out,
                "{:<6} {:>9.2} {:>11}",
                zone.time_label(interval.start_time),
                interval.per_kwh,
                interval.descriptor.as_str()
            );
        }
    }
    out
}

pub fn render_sites(sites: &[Site]) -> String {
    if sites.is_empty() {
        return "No sites found on this account.\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(out, "{:<28} {:<8} {:<12} {}", "Site", "Status", "NMI", "Network");
    for site in sites {
        let status = serde_json::to_value(site.status)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{:<28} {:<8} {:<12} {}",
            site.id,
            status,
            site.nmi.as_deref().unwrap_or("-"),
            site.network.as_deref().unwrap_or("-")
        );
    }
    out
}

pub fn render_report(report: &Report, zone: ViewerZone) -> String {
    match report {
        Report::Overview(r) => render_overview(r),
        Report::Detail(r) => render_detail(r),
        Report::Live(r) => render_live(r),
        Report::Prices(r) => render_outlook(r, zone),
    }
}

/// Full screen for the current dashboard state
pub fn render_view_state(state: &ViewState, zone: ViewerZone) -> String {
    match state {
        ViewState::Idle => String::new(),
        ViewState::Loading { operation, .. } => format!("Loading {}...\n", operation),
        ViewState::Ready { report, .. } => render_report(report, zone),
        ViewState::Failed {
            message,
            terminal,
            retry,
            ..
        } => {
            let mut out = format!("Error: {}\n", message);
            if let RetryState::CountingDown(seconds) = retry {
                let _ = writeln!(out, "{}", countdown_text(*seconds));
            }
            if *terminal {
                let _ = writeln!(out, "Run `amber-monitor login` to sign in again.");
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::Operation;
    use crate::error::MonitorError;
    use crate::report::{DailyStat, RangeTotals};
    use chrono::NaiveDate;

    #[test]
    fn dollars_from_cents() {
        assert_eq!(dollars(12345.0), "$123.45");
        assert_eq!(dollars(0.0), "$0.00");
    }

    #[test]
    fn countdown_pluralizes() {
        assert_eq!(countdown_text(1), "Retrying automatically in 1 second...");
        assert_eq!(countdown_text(30), "Retrying automatically in 30 seconds...");
    }

    #[test]
    fn overview_lists_every_day_with_dollar_totals() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let mut day = DailyStat::empty(date);
        day.total_usage_kwh = 5.0;
        day.total_cost_cents = 150.0;
        let days = vec![DailyStat::empty(date.pred_opt().unwrap()), day];
        let report = OverviewReport {
            start_date: days[0].date,
            end_date: date,
            totals: RangeTotals::from_days(&days),
            days,
        };
        let text = render_overview(&report);
        assert!(text.contains("Last 2 Days"));
        assert!(text.contains("Total Cost      $1.50"));
        assert!(text.contains("2024-06-09"));
        assert!(text.contains("2024-06-10"));
    }

    #[test]
    fn failed_state_shows_banner_and_countdown() {
        let err = MonitorError::rate_limited(3);
        let state = ViewState::Failed {
            generation: 1,
            operation: Operation::Overview,
            message: err.to_string(),
            terminal: err.is_terminal(),
            retry: RetryState::CountingDown(3),
        };
        let text = render_view_state(&state, ViewerZone::Local);
        assert!(text.contains("Rate limit exceeded. Please try again in 3 seconds."));
        assert!(text.contains("Retrying automatically in 3 seconds..."));
        assert!(!text.contains("login"));
    }

    #[test]
    fn terminal_failure_asks_for_login() {
        let err = MonitorError::InvalidCredential;
        let state = ViewState::Failed {
            generation: 1,
            operation: Operation::Overview,
            message: err.to_string(),
            terminal: err.is_terminal(),
            retry: RetryState::Idle,
        };
        let text = render_view_state(&state, ViewerZone::Local);
        assert!(text.contains("amber-monitor login"));
        assert!(!text.contains("Retrying"));
    }
}
