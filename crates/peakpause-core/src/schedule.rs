//! Rate-period classification
//!
//! Maps a local timestamp to the ULO time-of-use schedule. Pure, total,
//! and deterministic; the tables that attach prices to periods live in
//! `peakpause-config`.

use chrono::{DateTime, Datelike, Local, Timelike, Weekday};
use peakpause_config::RatePeriod;

/// Classify a timestamp into its rate period.
///
/// Precedence, first match wins:
/// 1. 11pm-7am is ultra-low on every day of the week.
/// 2. Weekends 7am-11pm are weekend off-peak.
/// 3. Weekdays: 7am-4pm mid-peak, 4pm-9pm on-peak, 9pm-11pm mid-peak.
pub fn classify(dt: &DateTime<Local>) -> RatePeriod {
    let hour = dt.hour();

    if hour >= 23 || hour < 7 {
        return RatePeriod::UltraLow;
    }

    if matches!(dt.weekday(), Weekday::Sat | Weekday::Sun) {
        return RatePeriod::WeekendOffPeak;
    }

    match hour {
        7..=15 => RatePeriod::MidPeak,
        16..=20 => RatePeriod::OnPeak,
        21..=22 => RatePeriod::MidPeak,
        // Unreachable: the overnight arm above covers everything else.
        _ => RatePeriod::MidPeak,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// 2025-01-06 is a Monday; day offsets walk the whole week.
    fn at(day_offset: u32, hour: u32, minute: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2025, 1, 6 + day_offset, hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn overnight_is_ultra_low_every_day() {
        for day in 0..7 {
            for hour in [23, 0, 1, 2, 3, 4, 5, 6] {
                assert_eq!(
                    classify(&at(day, hour, 0)),
                    RatePeriod::UltraLow,
                    "day offset {day}, hour {hour}"
                );
                assert_eq!(classify(&at(day, hour, 59)), RatePeriod::UltraLow);
            }
        }
    }

    #[test]
    fn weekend_daytime_is_weekend_off_peak() {
        // Offsets 5 and 6 are Saturday and Sunday.
        for day in [5, 6] {
            for hour in 7..23 {
                assert_eq!(
                    classify(&at(day, hour, 0)),
                    RatePeriod::WeekendOffPeak,
                    "day offset {day}, hour {hour}"
                );
            }
        }
    }

    #[test]
    fn ultra_low_takes_precedence_over_weekend() {
        assert_eq!(classify(&at(5, 23, 0)), RatePeriod::UltraLow);
        assert_eq!(classify(&at(6, 6, 59)), RatePeriod::UltraLow);
    }

    #[test]
    fn weekday_brackets() {
        for day in 0..5 {
            for hour in 7..16 {
                assert_eq!(classify(&at(day, hour, 0)), RatePeriod::MidPeak);
            }
            for hour in 16..21 {
                assert_eq!(classify(&at(day, hour, 0)), RatePeriod::OnPeak);
            }
            for hour in 21..23 {
                assert_eq!(classify(&at(day, hour, 0)), RatePeriod::MidPeak);
            }
        }
    }

    #[test]
    fn bracket_edges() {
        assert_eq!(classify(&at(0, 15, 59)), RatePeriod::MidPeak);
        assert_eq!(classify(&at(0, 16, 0)), RatePeriod::OnPeak);
        assert_eq!(classify(&at(0, 20, 59)), RatePeriod::OnPeak);
        assert_eq!(classify(&at(0, 21, 0)), RatePeriod::MidPeak);
        assert_eq!(classify(&at(0, 22, 59)), RatePeriod::MidPeak);
        assert_eq!(classify(&at(0, 23, 0)), RatePeriod::UltraLow);
    }

    #[test]
    fn classification_is_total_over_the_week() {
        // Every (day, hour) pair maps to exactly one period; just make sure
        // nothing panics and the four variants all occur.
        let mut seen = std::collections::HashSet::new();
        for day in 0..7 {
            for hour in 0..24 {
                seen.insert(classify(&at(day, hour, 30)));
            }
        }
        assert_eq!(seen.len(), 4);
    }
}
