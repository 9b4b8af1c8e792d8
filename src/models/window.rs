use chrono::{
    DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, Offset, SecondsFormat, TimeDelta,
    TimeZone, Utc,
};

use crate::config::Config;

/// Last millisecond of a calendar day
const END_OF_DAY: NaiveTime = match NaiveTime::from_hms_milli_opt(23, 59, 59, 999) {
    Some(time) => time,
    None => panic!("invalid end of day"),
};

/// Time range used to query historical data.
///
/// Only constructible from a calendar date: `end` is the last millisecond of
/// that day and `start` lies exactly [`Config::HISTORY_WINDOW_MS`] before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl QueryWindow {
    /// Window ending on `date` in the local time zone.
    pub fn ending_on(date: NaiveDate) -> Self {
        Self::ending_on_in(date, &Local)
    }

    /// Window ending on `date` in the given time zone.
    ///
    /// An ambiguous end of day resolves to the later instant. One skipped by a
    /// forward transition is read with the offset from before the transition,
    /// which lands past the gap.
    pub fn ending_on_in<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Self {
        let naive = date.and_time(END_OF_DAY);
        let end = match tz.from_local_datetime(&naive).latest() {
            Some(dt) => dt.with_timezone(&Utc),
            None => Self::across_gap(naive, tz),
        };

        Self {
            start: end - TimeDelta::milliseconds(Config::HISTORY_WINDOW_MS),
            end,
        }
    }

    fn across_gap<Tz: TimeZone>(naive: NaiveDateTime, tz: &Tz) -> DateTime<Utc> {
        let offset_secs = tz
            .offset_from_local_datetime(&(naive - TimeDelta::days(1)))
            .earliest()
            .map_or(0, |offset| offset.fix().local_minus_utc());
        (naive - TimeDelta::seconds(i64::from(offset_secs))).and_utc()
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Start as sent to the API, e.g. `2023-06-23T11:59:59.999Z`
    pub fn start_iso(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// End as sent to the API, e.g. `2023-06-28T11:59:59.999Z`
    pub fn end_iso(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, LocalResult};

    /// +12:00 until 2023-09-24T11:30Z, then +13:00, so local times from
    /// 23:30 on the 24th up to 00:30 on the 25th never occur.
    #[derive(Clone, Copy)]
    struct SpringForward;

    impl SpringForward {
        fn transition() -> NaiveDateTime {
            date(2023, 9, 24).and_hms_opt(11, 30, 0).unwrap()
        }

        fn before() -> FixedOffset {
            FixedOffset::east_opt(12 * 3600).unwrap()
        }

        fn after() -> FixedOffset {
            FixedOffset::east_opt(13 * 3600).unwrap()
        }
    }

    impl TimeZone for SpringForward {
        type Offset = FixedOffset;

        fn from_offset(_: &FixedOffset) -> Self {
            Self
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_time(NaiveTime::MIN))
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let gap_start = Self::transition() + TimeDelta::hours(12);
            let gap_end = Self::transition() + TimeDelta::hours(13);
            if *local < gap_start {
                LocalResult::Single(Self::before())
            } else if *local < gap_end {
                LocalResult::None
            } else {
                LocalResult::Single(Self::after())
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_time(NaiveTime::MIN))
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            if *utc < Self::transition() {
                Self::before()
            } else {
                Self::after()
            }
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_window_in_utc() {
        let window = QueryWindow::ending_on_in(date(2023, 6, 28), &Utc);
        assert_eq!(window.end_iso(), "2023-06-28T23:59:59.999Z");
        assert_eq!(window.start_iso(), "2023-06-23T23:59:59.999Z");
    }

    #[test]
    fn test_window_in_new_zealand_standard_time() {
        let nzst = FixedOffset::east_opt(12 * 3600).unwrap();
        let window = QueryWindow::ending_on_in(date(2023, 6, 28), &nzst);
        assert_eq!(window.end_iso(), "2023-06-28T11:59:59.999Z");
        assert_eq!(window.start_iso(), "2023-06-23T11:59:59.999Z");
    }

    #[test]
    fn test_window_length_is_exactly_five_days() {
        let window = QueryWindow::ending_on(date(2024, 2, 29));
        assert_eq!(
            (window.end() - window.start()).num_milliseconds(),
            432_000_000
        );
    }

    #[test]
    fn test_window_end_is_local_end_of_day() {
        let day = date(2023, 6, 28);
        let window = QueryWindow::ending_on(day);
        assert_eq!(
            window.end().with_timezone(&Local).naive_local(),
            day.and_hms_milli_opt(23, 59, 59, 999).unwrap()
        );
    }

    #[test]
    fn test_window_crosses_year_boundary() {
        let window = QueryWindow::ending_on_in(date(2024, 1, 2), &Utc);
        assert_eq!(window.start_iso(), "2023-12-28T23:59:59.999Z");
    }

    #[test]
    fn test_end_of_day_in_gap_moves_forward() {
        let window = QueryWindow::ending_on_in(date(2023, 9, 24), &SpringForward);
        assert_eq!(window.end_iso(), "2023-09-24T11:59:59.999Z");
        assert_eq!(
            window.end().with_timezone(&SpringForward).naive_local(),
            date(2023, 9, 25).and_hms_milli_opt(0, 59, 59, 999).unwrap()
        );
    }

    #[test]
    fn test_end_of_day_next_to_gap_is_unaffected() {
        let window = QueryWindow::ending_on_in(date(2023, 9, 25), &SpringForward);
        assert_eq!(window.end_iso(), "2023-09-25T10:59:59.999Z");
    }
}
