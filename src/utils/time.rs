use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone};

/// This is the standard way of converting a date to a calendar-day string in the checklist, e.g.
/// `Mon Jan 01 2024`. Only ever compared for equality.
pub fn calendar_day_string(date: NaiveDate) -> String {
    date.format("%a %b %d %Y").to_string()
}

/// Time left until `hour:minute` of the same calendar day as `now`. Negative once that moment
/// has passed. Returns [None] if the wall time doesn't exist that day (DST gap).
pub fn delay_until_today_at<Tz: TimeZone>(
    now: &DateTime<Tz>,
    hour: u32,
    minute: u32,
) -> Option<TimeDelta> {
    let target = now
        .date_naive()
        .and_hms_opt(hour, minute, 0)?
        .and_local_timezone(now.timezone())
        .earliest()?;
    Some(target - now.clone())
}
