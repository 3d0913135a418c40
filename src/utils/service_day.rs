use chrono::{DateTime, Days, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// A delivery date in the configured time zone.
///
/// Both jobs act on "tomorrow": the calendar day after the trigger's local date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceDay {
    date: NaiveDate,
    tz: Tz,
}

/// Closed timestamp interval covering one service day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

impl ServiceDay {
    pub fn new(date: NaiveDate, tz: Tz) -> Self {
        Self { date, tz }
    }

    pub fn tomorrow(now: DateTime<Utc>, tz: Tz) -> Self {
        let today = now.with_timezone(&tz).date_naive();
        Self::new(today.succ_opt().unwrap_or(today), tz)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// `YYYY-MM-DD`, zero padded. Part of every order id.
    pub fn key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    pub fn start(&self) -> DateTime<Utc> {
        local_start(self.date, self.tz)
    }

    /// `[00:00:00.000, 23:59:59.999]` local time.
    pub fn window(&self) -> DayWindow {
        let next = self.date.succ_opt().unwrap_or(self.date);
        DayWindow {
            start: self.start(),
            end: local_start(next, self.tz) - Duration::milliseconds(1),
        }
    }

    /// Local calendar date of `at` in this day's time zone.
    pub fn local_date_of(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.tz).date_naive()
    }
}

/// First existing local instant of `date`. Midnight can fall into a DST gap,
/// in which case the day starts at the end of the gap.
fn local_start(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    resolve_local(date.and_time(chrono::NaiveTime::MIN), tz)
}

/// Maps a local wall time to an instant. Repeated times (fall-back) take the
/// earlier instant; skipped times (spring-forward) move to the first valid
/// quarter hour after the gap.
fn resolve_local(local: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    (0..=4 * 24)
        .map(|quarter| local + Duration::minutes(15 * quarter))
        .find_map(|candidate| tz.from_local_datetime(&candidate).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&local))
}

/// Moves `at` forward by whole calendar days in `tz`, keeping the local wall
/// time where it exists. `None` only past the end of the calendar.
pub fn add_local_days(at: DateTime<Utc>, days: u64, tz: Tz) -> Option<DateTime<Utc>> {
    let local = at.with_timezone(&tz).naive_local();
    local
        .checked_add_days(Days::new(days))
        .map(|shifted| resolve_local(shifted, tz))
}
