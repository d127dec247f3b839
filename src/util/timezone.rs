//! Conversions between stored UTC instants and the site's display timezone.

use chrono::{DateTime, Datelike, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use time::{OffsetDateTime, UtcOffset};

/// Calendar date as seen in the display timezone, used for URL segments and
/// cache keys. Month and day are not zero padded when formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

pub fn localized_datetime(time: OffsetDateTime, tz: Tz) -> DateTime<Tz> {
    let utc = time.to_offset(UtcOffset::UTC);
    let datetime_utc = DateTime::<Utc>::from_timestamp(utc.unix_timestamp(), utc.nanosecond())
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    tz.from_utc_datetime(&datetime_utc.naive_utc())
}

pub fn display_date(time: OffsetDateTime, tz: Tz) -> DisplayDate {
    let localized = localized_datetime(time, tz);
    DisplayDate {
        year: localized.year(),
        month: localized.month(),
        day: localized.day(),
    }
}

/// `dd/mm/yyyy` in the display timezone.
pub fn format_display_date(time: OffsetDateTime, tz: Tz) -> String {
    localized_datetime(time, tz).format("%d/%m/%Y").to_string()
}

/// UTC bounds `[start, end)` of a calendar day in `tz`. `None` for dates that
/// do not exist.
pub fn day_window(
    tz: Tz,
    year: i32,
    month: u32,
    day: u32,
) -> Option<(OffsetDateTime, OffsetDateTime)> {
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let next = date.succ_opt()?;
    let start = start_of_day(tz, date)?;
    let end = start_of_day(tz, next)?;
    Some((start, end))
}

fn start_of_day(tz: Tz, date: NaiveDate) -> Option<OffsetDateTime> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    let local = match tz.from_local_datetime(&midnight) {
        LocalResult::Single(value) => value,
        LocalResult::Ambiguous(earliest, _) => earliest,
        // Midnight skipped by a DST jump: the day starts at the first valid hour.
        LocalResult::None => first_valid_after(tz, midnight)?,
    };
    OffsetDateTime::from_unix_timestamp(local.timestamp()).ok()
}

fn first_valid_after(tz: Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    (1..=3).find_map(|hours| {
        tz.from_local_datetime(&(naive + chrono::Duration::hours(hours)))
            .earliest()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;
    use time::macros::datetime;

    #[test]
    fn display_date_uses_display_timezone_not_utc() {
        let instant = datetime!(2024-03-01 02:30 UTC);
        let date = display_date(instant, chrono_tz::America::Santiago);
        assert_eq!(
            date,
            DisplayDate {
                year: 2024,
                month: 2,
                day: 29
            }
        );

        let utc = display_date(instant, chrono_tz::UTC);
        assert_eq!((utc.month, utc.day), (3, 1));
    }

    #[test]
    fn day_window_spans_local_midnights() {
        let (start, end) =
            day_window(chrono_tz::America::Santiago, 2024, 2, 29).expect("valid day");
        assert_eq!(start, datetime!(2024-02-29 03:00 UTC));
        assert_eq!(end, datetime!(2024-03-01 03:00 UTC));
        assert_eq!(end - start, Duration::hours(24));

        let instant = datetime!(2024-03-01 02:30 UTC);
        assert!(start <= instant && instant < end);
    }

    #[test]
    fn day_window_rejects_impossible_dates() {
        assert!(day_window(chrono_tz::UTC, 2023, 2, 29).is_none());
        assert!(day_window(chrono_tz::UTC, 2024, 13, 1).is_none());
    }
}
