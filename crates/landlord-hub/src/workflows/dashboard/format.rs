use chrono::{DateTime, Duration, Utc};

pub const UNKNOWN_DATE_LABEL: &str = "Unknown date";

/// "Oct 1, 2025"
pub fn format_date(timestamp: Option<DateTime<Utc>>) -> String {
    match timestamp {
        Some(timestamp) => timestamp.format("%b %-d, %Y").to_string(),
        None => UNKNOWN_DATE_LABEL.to_string(),
    }
}

/// Coarse "5m ago" style age. Negative ages read as "just now".
pub fn relative_age(age: Duration) -> String {
    let minutes = age.num_minutes();
    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if age.num_hours() < 24 {
        format!("{}h ago", age.num_hours())
    } else {
        format!("{}d ago", age.num_days())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_calendar_dates() {
        let timestamp = Utc.with_ymd_and_hms(2025, 10, 1, 23, 30, 0).single();
        assert_eq!(format_date(timestamp), "Oct 1, 2025");
        assert_eq!(format_date(None), UNKNOWN_DATE_LABEL);
    }

    #[test]
    fn relative_ages_round_down() {
        assert_eq!(relative_age(Duration::seconds(30)), "just now");
        assert_eq!(relative_age(-Duration::hours(3)), "just now");
        assert_eq!(relative_age(Duration::minutes(59)), "59m ago");
        assert_eq!(relative_age(Duration::hours(23) + Duration::minutes(59)), "23h ago");
        assert_eq!(relative_age(Duration::hours(49)), "2d ago");
    }
}
