use chrono::{DateTime, Utc};

/// Maps elapsed hours onto the copy bucket: 0, 1, 3, 6, 12 or 24.
pub fn time_bucket(hours: f64) -> u32 {
    if hours < 1.0 {
        0
    } else if hours < 3.0 {
        1
    } else if hours < 6.0 {
        3
    } else if hours < 12.0 {
        6
    } else if hours < 24.0 {
        12
    } else {
        24
    }
}

/// Hours between `since` and `now`; zero when there is no reference point.
pub fn hours_since(since: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    match since {
        Some(since) => ((now - since).num_milliseconds().max(0) as f64) / 3_600_000.0,
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_buckets() {
        assert_eq!(time_bucket(0.0), 0);
        assert_eq!(time_bucket(0.99), 0);
        assert_eq!(time_bucket(1.0), 1);
        assert_eq!(time_bucket(2.5), 1);
        assert_eq!(time_bucket(5.0), 3);
        assert_eq!(time_bucket(11.9), 6);
        assert_eq!(time_bucket(12.0), 12);
        assert_eq!(time_bucket(100.0), 24);
    }

    #[test]
    fn test_hours_since() {
        let now = Utc::now();
        assert_eq!(hours_since(None, now), 0.0);
        assert_eq!(hours_since(Some(now - Duration::minutes(90)), now), 1.5);
        assert_eq!(hours_since(Some(now + Duration::minutes(5)), now), 0.0);
    }
}
