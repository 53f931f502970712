//! Splitting a trailing date window into API-sized requests

use chrono::{Days, NaiveDate};
use serde::Serialize;

/// Inclusive date sub-range sent as one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateChunk {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateChunk {
    /// Number of calendar dates covered
    pub fn span_days(&self) -> u32 {
        let days = (self.end_date - self.start_date).num_days() + 1;
        u32::try_from(days.max(0)).unwrap_or(0)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// The `days` dates ending at `end`, oldest first
pub fn window_dates(end: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..days)
        .rev()
        .filter_map(|offset| end.checked_sub_days(Days::new(u64::from(offset))))
        .collect()
}

/// Tile the `days` dates ending at `end` with chunks of at most `max_span`
/// dates, newest chunk first. The first chunk always ends at `end`.
pub fn chunk_trailing_window(end: NaiveDate, days: u32, max_span: u32) -> Vec<DateChunk> {
    let max_span = max_span.max(1);
    let mut chunks = Vec::new();
    let mut offset = 0;
    while offset < days {
        let last_offset = (offset + max_span - 1).min(days - 1);
        let (Some(end_date), Some(start_date)) = (
            end.checked_sub_days(Days::new(u64::from(offset))),
            end.checked_sub_days(Days::new(u64::from(last_offset))),
        ) else {
            break;
        };
        chunks.push(DateChunk {
            start_date,
            end_date,
        });
        offset += max_span;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn thirty_days_in_seven_day_chunks() {
        let today = d(2024, 3, 15);
        let chunks = chunk_trailing_window(today, 30, 7);
        let spans: Vec<u32> = chunks.iter().map(DateChunk::span_days).collect();
        assert_eq!(spans, vec![7, 7, 7, 7, 2]);
        assert_eq!(chunks[0].end_date, today);
        assert_eq!(chunks[0].start_date, d(2024, 3, 9));
        assert_eq!(chunks[4].start_date, d(2024, 2, 15));
        assert_eq!(chunks[4].end_date, d(2024, 2, 16));
    }

    #[test]
    fn chunks_tile_the_window_exactly() {
        let today = d(2024, 1, 3);
        for days in 1..=45 {
            for span in 1..=7 {
                let chunks = chunk_trailing_window(today, days, span);
                let dates = window_dates(today, days);
                assert_eq!(dates.len() as u32, days);
                for date in &dates {
                    let covering = chunks.iter().filter(|c| c.contains(*date)).count();
                    assert_eq!(covering, 1, "{date} covered {covering} times");
                }
                let total: u32 = chunks.iter().map(DateChunk::span_days).sum();
                assert_eq!(total, days);
                assert!(chunks.iter().all(|c| c.span_days() <= span));
                assert_eq!(chunks[0].end_date, today);
            }
        }
    }

    #[test]
    fn window_dates_are_oldest_first() {
        let dates = window_dates(d(2024, 3, 1), 3);
        assert_eq!(dates, vec![d(2024, 2, 28), d(2024, 2, 29), d(2024, 3, 1)]);
    }

    #[test]
    fn empty_window() {
        assert!(chunk_trailing_window(d(2024, 3, 1), 0, 7).is_empty());
        assert!(window_dates(d(2024, 3, 1), 0).is_empty());
    }
}
