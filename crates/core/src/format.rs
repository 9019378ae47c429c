use chrono::{DateTime, Utc};

/// Structural check for a base58 account address (32 to 44 characters of
/// the base58 alphabet). Does not prove the address exists on chain.
pub fn is_valid_address(address: &str) -> bool {
    let len = address.chars().count();
    if !(32..=44).contains(&len) {
        return false;
    }
    address.chars().all(is_base58_char)
}

fn is_base58_char(c: char) -> bool {
    // base58 drops 0, O, I and l
    matches!(c, '1'..='9' | 'A'..='H' | 'J'..='N' | 'P'..='Z' | 'a'..='k' | 'm'..='z')
}

/// Shorten an address or signature for display, e.g. "Abc1...xyz9".
pub fn truncate_address(address: &str, start_chars: usize, end_chars: usize) -> String {
    if address.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= start_chars + end_chars {
        return address.to_string();
    }
    let head: String = chars[..start_chars].iter().collect();
    let tail: String = chars[chars.len() - end_chars..].iter().collect();
    format!("{head}...{tail}")
}

/// Coarse relative-time label for listings ("2h ago", "Just now").
pub fn relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(timestamp);
    if diff.num_days() > 0 {
        format!("{}d ago", diff.num_days())
    } else if diff.num_hours() > 0 {
        format!("{}h ago", diff.num_hours())
    } else if diff.num_minutes() > 0 {
        format!("{}m ago", diff.num_minutes())
    } else {
        "Just now".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const GOOD_ADDR: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";

    #[test]
    fn accepts_real_shaped_addresses() {
        assert!(is_valid_address(GOOD_ADDR));
        assert!(is_valid_address("So11111111111111111111111111111111111111112"));
    }

    #[test]
    fn rejects_bad_addresses() {
        assert!(!is_valid_address(""));
        assert!(!is_valid_address("too-short"));
        // 0, O, I and l are not base58
        assert!(!is_valid_address("0xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU"));
        assert!(!is_valid_address(&"a".repeat(45)));
    }

    #[test]
    fn truncates_long_addresses_only() {
        assert_eq!(truncate_address(GOOD_ADDR, 4, 4), "7xKX...gAsU");
        assert_eq!(truncate_address("short", 4, 4), "short");
        assert_eq!(truncate_address("", 4, 4), "");
    }

    #[test]
    fn relative_time_buckets() {
        let now = Utc::now();
        assert_eq!(relative_time(now, now), "Just now");
        assert_eq!(relative_time(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(relative_time(now - Duration::hours(3), now), "3h ago");
        assert_eq!(relative_time(now - Duration::days(2), now), "2d ago");
    }
}
