//! 人类可读的时长 ("1 hr 5 min", "12 sec", "350 ms")

use chrono::Duration;

/// 用最大的两个单位格式化毫秒时长
pub fn format_time_span(millis: i64) -> String {
    let span = Duration::milliseconds(millis.max(0));

    let days = span.num_days();
    let hours = span.num_hours() % 24;
    let minutes = span.num_minutes() % 60;
    let seconds = span.num_seconds() % 60;
    let ms = span.num_milliseconds() % 1000;

    if days > 0 {
        format!("{} {} {} hr", days, plural(days, "day"), hours)
    } else if hours > 0 {
        format!("{} hr {} min", hours, minutes)
    } else if minutes > 0 {
        format!("{} min {} sec", minutes, seconds)
    } else if seconds >= 10 {
        format!("{} sec", seconds)
    } else if seconds >= 1 {
        format!("{}.{} sec", seconds, ms / 100)
    } else {
        format!("{} ms", ms)
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        unit.to_string()
    } else {
        format!("{}s", unit)
    }
}
