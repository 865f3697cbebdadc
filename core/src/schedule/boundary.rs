//! Calendar boundaries, all in UTC.

use chrono::{DateTime, Datelike, Days, NaiveTime, Utc, Weekday};
use stream_out_types::{ResetWeekday, WeeklyReset};

/// Next UTC midnight strictly after `now`.
pub fn next_daily_reset(now: DateTime<Utc>) -> DateTime<Utc> {
    let tomorrow = now
        .date_naive()
        .checked_add_days(Days::new(1))
        .unwrap_or(now.date_naive());
    tomorrow.and_time(NaiveTime::MIN).and_utc()
}

/// Next weekly reset strictly after `now`.
pub fn next_weekly_reset(now: DateTime<Utc>, weekly: &WeeklyReset) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(weekly.hour, weekly.minute, 0).unwrap_or_else(|| {
        tracing::warn!(hour = weekly.hour, minute = weekly.minute, "Invalid weekly reset time, using midnight");
        NaiveTime::MIN
    });

    let target = weekday(weekly.weekday).num_days_from_monday();
    let today = now.weekday().num_days_from_monday();
    let days_ahead = (target + 7 - today) % 7;

    let today_date = now.date_naive();
    let candidate = today_date
        .checked_add_days(Days::new(u64::from(days_ahead)))
        .unwrap_or(today_date)
        .and_time(time)
        .and_utc();

    if candidate > now {
        candidate
    } else {
        candidate
            .checked_add_days(Days::new(7))
            .unwrap_or(candidate)
    }
}

fn weekday(day: ResetWeekday) -> Weekday {
    match day {
        ResetWeekday::Monday => Weekday::Mon,
        ResetWeekday::Tuesday => Weekday::Tue,
        ResetWeekday::Wednesday => Weekday::Wed,
        ResetWeekday::Thursday => Weekday::Thu,
        ResetWeekday::Friday => Weekday::Fri,
        ResetWeekday::Saturday => Weekday::Sat,
        ResetWeekday::Sunday => Weekday::Sun,
    }
}
