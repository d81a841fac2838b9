use chrono::NaiveDate;

/// Truncate a string to a maximum number of characters, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an optional date as `DD/MM/YYYY`, or `-` when absent
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Trimmed value, or `-` for blank strings
pub fn display_or_dash(value: &str) -> &str {
    let value = value.trim();
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        // Counts characters, not bytes.
        assert_eq!(truncate_string("Nguyễn Văn A", 12), "Nguyễn Văn A");
        assert_eq!(truncate_string("Nguyễn Văn A", 9), "Nguyễn...");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(NaiveDate::from_ymd_opt(2024, 9, 1)), "01/09/2024");
        assert_eq!(format_date(None), "-");
    }

    #[test]
    fn test_display_or_dash() {
        assert_eq!(display_or_dash("  GV01 "), "GV01");
        assert_eq!(display_or_dash("   "), "-");
    }
}
