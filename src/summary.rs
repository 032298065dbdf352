//! Descriptive statistics and sampling-frequency inference.

use chrono::{DateTime, Datelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::series::{PriceField, SeriesView};
use crate::window::mean_std;

const MINUTE: i64 = 60;
const HOUR: i64 = 3_600;
const DAY: i64 = 86_400;
const WEEK: i64 = 7 * DAY;

/// Sampling frequency of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Frequency {
    Minutely,
    Hourly,
    Daily,
    BusinessDaily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
    Irregular,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Minutely => "minutely",
            Frequency::Hourly => "hourly",
            Frequency::Daily => "daily",
            Frequency::BusinessDaily => "business-daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Yearly => "yearly",
            Frequency::Irregular => "irregular",
        }
    }
}

/// Summary of one price column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub ticker: String,
    pub column: PriceField,
    pub point_count: usize,
    pub frequency: Frequency,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    pub start_price: f64,
    pub end_price: f64,
    /// Percent change from first to last value; `None` when the first value is 0
    pub percent_change: Option<f64>,
}

pub fn summarize(view: &SeriesView, column: PriceField) -> SummaryResult {
    let values = view.column(column);
    let timestamps: Vec<_> = view.bars().iter().map(|b| b.timestamp).collect();

    let (mean, std) = mean_std(&values).unwrap_or((0.0, 0.0));
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let start_price = values[0];
    let end_price = values[values.len() - 1];
    let percent_change =
        (start_price != 0.0).then(|| (end_price - start_price) / start_price.abs() * 100.0);

    SummaryResult {
        ticker: view.ticker().to_string(),
        column,
        point_count: values.len(),
        frequency: infer_frequency(&timestamps),
        start: view.first().timestamp,
        end: view.last().timestamp,
        min,
        max,
        mean,
        std,
        start_price,
        end_price,
        percent_change,
    }
}

/// Classify the spacing of strictly increasing timestamps.
pub fn infer_frequency(timestamps: &[DateTime<Utc>]) -> Frequency {
    if timestamps.len() < 2 {
        return Frequency::Irregular;
    }
    let deltas: Vec<i64> = timestamps
        .windows(2)
        .map(|w| (w[1] - w[0]).num_seconds())
        .collect();

    if deltas.iter().all(|&d| d == deltas[0]) {
        match deltas[0] {
            MINUTE => return Frequency::Minutely,
            HOUR => return Frequency::Hourly,
            DAY => return Frequency::Daily,
            WEEK => return Frequency::Weekly,
            _ => {}
        }
    }

    if is_business_daily(timestamps, &deltas) {
        return Frequency::BusinessDaily;
    }

    let days_between = |lo: i64, hi: i64| {
        deltas
            .iter()
            .all(|&d| d % DAY == 0 && (lo..=hi).contains(&(d / DAY)))
    };
    if days_between(28, 31) {
        return Frequency::Monthly;
    }
    if days_between(89, 92) {
        return Frequency::Quarterly;
    }
    if days_between(365, 366) {
        return Frequency::Yearly;
    }

    let mut sorted = deltas.clone();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2
    } else {
        sorted[mid]
    };
    match median {
        d if d <= MINUTE => Frequency::Minutely,
        d if d <= HOUR => Frequency::Hourly,
        d if d <= DAY => Frequency::Daily,
        d if d <= WEEK => Frequency::Weekly,
        d if d <= 31 * DAY => Frequency::Monthly,
        _ => Frequency::Irregular,
    }
}

// Weekdays only, one day apart except Friday -> Monday, with at least one weekend skipped.
fn is_business_daily(timestamps: &[DateTime<Utc>], deltas: &[i64]) -> bool {
    let weekend = |t: &DateTime<Utc>| matches!(t.weekday(), Weekday::Sat | Weekday::Sun);
    if timestamps.iter().any(weekend) {
        return false;
    }
    let mut skipped_weekend = false;
    for (w, &d) in timestamps.windows(2).zip(deltas) {
        if d == DAY {
            continue;
        }
        if d == 3 * DAY && w[0].weekday() == Weekday::Fri {
            skipped_weekend = true;
            continue;
        }
        return false;
    }
    skipped_weekend
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Bar;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        // Monday
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_uniform_frequencies() {
        let daily: Vec<_> = (0..10).map(|i| start() + Duration::days(i)).collect();
        assert_eq!(infer_frequency(&daily), Frequency::Daily);

        let hourly: Vec<_> = (0..10).map(|i| start() + Duration::hours(i)).collect();
        assert_eq!(infer_frequency(&hourly), Frequency::Hourly);

        let weekly: Vec<_> = (0..10).map(|i| start() + Duration::weeks(i)).collect();
        assert_eq!(infer_frequency(&weekly), Frequency::Weekly);
    }

    #[test]
    fn test_business_days() {
        let days: Vec<_> = (0..30)
            .map(|i| start() + Duration::days(i))
            .filter(|t| !matches!(t.weekday(), Weekday::Sat | Weekday::Sun))
            .collect();
        assert_eq!(infer_frequency(&days), Frequency::BusinessDaily);
    }

    #[test]
    fn test_monthly_calendar() {
        let months: Vec<_> = (1..=6)
            .map(|m| Utc.with_ymd_and_hms(2024, m, 1, 0, 0, 0).unwrap())
            .collect();
        assert_eq!(infer_frequency(&months), Frequency::Monthly);
    }

    #[test]
    fn test_single_point_is_irregular() {
        assert_eq!(infer_frequency(&[start()]), Frequency::Irregular);
    }

    #[test]
    fn test_summary_stats() {
        let bars: Vec<_> = [10.0, 12.0, 14.0]
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(start() + Duration::days(i as i64), c, c, c, c, 1.0))
            .collect();
        let view = SeriesView::new("ABC", bars).unwrap();
        let s = summarize(&view, PriceField::Close);

        assert_eq!(s.point_count, 3);
        assert_eq!(s.min, 10.0);
        assert_eq!(s.max, 14.0);
        assert!((s.mean - 12.0).abs() < 1e-12);
        assert!((s.std - (8.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!((s.percent_change.unwrap() - 40.0).abs() < 1e-9);
        assert_eq!(s.frequency, Frequency::Daily);
    }

    #[test]
    fn test_zero_start_has_no_percent_change() {
        let bars = vec![
            Bar::new(start(), 0.0, 0.0, 0.0, 0.0, 1.0),
            Bar::new(start() + Duration::days(1), 1.0, 1.0, 1.0, 1.0, 1.0),
        ];
        let view = SeriesView::new("Z", bars).unwrap();
        assert_eq!(summarize(&view, PriceField::Close).percent_change, None);
    }
}
