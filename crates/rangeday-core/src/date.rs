//! Local-calendar-day helpers.
//!
//! Day keys are local calendar dates (`NaiveDate`) serialized as
//! `YYYY-MM-DD`; instants are `DateTime<Utc>`. Weekdays use the stored
//! numbering with Sunday = 0, which is what event records carry.

use chrono::{
    DateTime, Datelike, Duration, Local, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc,
};

pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

pub fn parse_day_key(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DAY_KEY_FORMAT).ok()
}

pub fn format_day_key(day: NaiveDate) -> String {
    day.format(DAY_KEY_FORMAT).to_string()
}

/// Every calendar day in the inclusive range. Empty when start > end.
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut day = start;
    while day <= end {
        days.push(day);
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    days
}

/// Weekday number of `day` with Sunday = 0 .. Saturday = 6.
pub fn weekday_number(day: NaiveDate) -> u8 {
    day.weekday().num_days_from_sunday() as u8
}

/// The current local calendar day.
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// Monday of the week containing `day`.
pub fn start_of_week(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
}

/// Sunday of the week containing `day`.
pub fn end_of_week(day: NaiveDate) -> NaiveDate {
    start_of_week(day) + Duration::days(6)
}

/// Retention deadline for a session on `day_key`: local end of the
/// following day. Ambiguous or skipped local times (DST transitions) fall
/// back to the UTC reading of the same wall-clock value.
pub fn keep_until(day_key: NaiveDate) -> DateTime<Utc> {
    let next = day_key + Duration::days(1);
    let eod = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    let wall = next.and_time(eod);
    match Local.from_local_datetime(&wall) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => Utc.from_utc_datetime(&wall),
    }
}

/// `MM:SS`, or `HH:MM:SS` once a full hour is involved. Negative inputs
/// render as zero.
pub fn format_hms(total_seconds: i64) -> String {
    let s = total_seconds.max(0);
    let hh = s / 3600;
    let mm = (s % 3600) / 60;
    let ss = s % 60;
    if hh > 0 {
        format!("{hh:02}:{mm:02}:{ss:02}")
    } else {
        format!("{mm:02}:{ss:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        parse_day_key(s).expect("valid day key")
    }

    #[test]
    fn day_key_round_trip() {
        let d = day("2026-03-09");
        assert_eq!(format_day_key(d), "2026-03-09");
        assert_eq!(parse_day_key(" 2026-03-09 "), Some(d));
        assert_eq!(parse_day_key("not-a-date"), None);
    }

    #[test]
    fn days_inclusive_covers_both_ends() {
        let days = days_inclusive(day("2026-01-30"), day("2026-02-02"));
        assert_eq!(
            days,
            vec![
                day("2026-01-30"),
                day("2026-01-31"),
                day("2026-02-01"),
                day("2026-02-02"),
            ]
        );
    }

    #[test]
    fn days_inclusive_empty_when_reversed() {
        assert!(days_inclusive(day("2026-02-02"), day("2026-02-01")).is_empty());
    }

    #[test]
    fn weekday_number_is_sunday_based() {
        // 2026-03-08 is a Sunday.
        assert_eq!(weekday_number(day("2026-03-08")), 0);
        assert_eq!(weekday_number(day("2026-03-09")), 1);
        assert_eq!(weekday_number(day("2026-03-14")), 6);
    }

    #[test]
    fn week_bounds_are_monday_to_sunday() {
        let wednesday = day("2026-03-11");
        assert_eq!(start_of_week(wednesday), day("2026-03-09"));
        assert_eq!(end_of_week(wednesday), day("2026-03-15"));
        // A Monday is its own week start.
        assert_eq!(start_of_week(day("2026-03-09")), day("2026-03-09"));
    }

    #[test]
    fn keep_until_lands_on_the_following_day() {
        let deadline = keep_until(day("2026-03-09"));
        let local_day = deadline.with_timezone(&Local).date_naive();
        assert_eq!(local_day, day("2026-03-10"));
    }

    #[test]
    fn format_hms_variants() {
        assert_eq!(format_hms(0), "00:00");
        assert_eq!(format_hms(-5), "00:00");
        assert_eq!(format_hms(65), "01:05");
        assert_eq!(format_hms(3600), "01:00:00");
        assert_eq!(format_hms(3661), "01:01:01");
    }
}
