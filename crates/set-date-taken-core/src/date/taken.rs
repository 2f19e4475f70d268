use super::DateValue;

/// Parse an EXIF `YYYY:MM:DD HH:MM:SS` string.
///
/// Anything that does not split into exactly six tokens yields
/// [`DateValue::invalid`]; out-of-range numbers survive parsing and are
/// rejected later by [`DateValue::is_valid`].
pub fn parse_date_taken(text: &str) -> DateValue {
    let tokens: Vec<&str> = text
        .split([':', ' '])
        .filter(|t| !t.is_empty())
        .collect();

    let [year, month, day, hour, minute, second] = tokens.as_slice() else {
        return DateValue::invalid();
    };

    DateValue::new(
        leading_int(year),
        leading_int(month),
        leading_int(day),
        leading_int(hour),
        leading_int(minute),
        leading_int(second),
    )
}

/// `atol`-style conversion: optional sign and leading digits, 0 when none.
fn leading_int(token: &str) -> i32 {
    let s = token.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value = digits[..end]
        .bytes()
        .fold(0i64, |acc, b| (acc * 10 + i64::from(b - b'0')).min(i64::from(i32::MAX)));
    let value = if negative { -value } else { value };
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exif_string() {
        let d = parse_date_taken("2019:05:04 09:15:00");
        assert_eq!(d, DateValue::new(2019, 5, 4, 9, 15, 0));
        assert!(d.is_valid());
    }

    #[test]
    fn test_round_trip() {
        for d in [
            DateValue::new(2020, 2, 29, 0, 0, 0),
            DateValue::new(1999, 12, 31, 23, 59, 59),
            DateValue::new(45, 7, 4, 6, 5, 4),
        ] {
            let text = d.format_date();
            assert_eq!(parse_date_taken(&text), d);
            assert_eq!(parse_date_taken(&text).format_date(), text);
        }
    }

    #[test]
    fn test_wrong_token_count() {
        assert_eq!(parse_date_taken(""), DateValue::invalid());
        assert_eq!(parse_date_taken("2020:01:01"), DateValue::invalid());
        assert_eq!(parse_date_taken("2020:01:01 10:00"), DateValue::invalid());
        assert_eq!(
            parse_date_taken("2020:01:01 10:00:00 extra"),
            DateValue::invalid()
        );
        assert_eq!(
            parse_date_taken("2020-01-01 10:00:00"),
            DateValue::invalid()
        );
    }

    #[test]
    fn test_calendar_rejects() {
        assert!(!parse_date_taken("2020:13:01 10:00:00").is_valid());
        assert!(!parse_date_taken("2020:02:30 00:00:00").is_valid());
        assert!(!parse_date_taken("2020:01:00 00:00:00").is_valid());
    }

    #[test]
    fn test_consecutive_delimiters() {
        assert_eq!(
            parse_date_taken("2021::03:04  05:06:07 "),
            DateValue::new(2021, 3, 4, 5, 6, 7)
        );
    }

    #[test]
    fn test_non_numeric_tokens() {
        // blank EXIF dates are often stored as spaces and colons
        assert_eq!(parse_date_taken("    :  :     :  :  "), DateValue::invalid());
        let d = parse_date_taken("abcd:05:04 09:15:00");
        assert_eq!(d.year, 0);
        assert!(!d.is_valid());
        assert_eq!(parse_date_taken("2019:05:04 09:15:00x").second, 0);
        assert_eq!(parse_date_taken("2019:05:04 09:15:07x").second, 7);
    }

    #[test]
    fn test_leading_int() {
        assert_eq!(leading_int("42"), 42);
        assert_eq!(leading_int("-7"), -7);
        assert_eq!(leading_int("+3x"), 3);
        assert_eq!(leading_int("x3"), 0);
        assert_eq!(leading_int("99999999999"), i32::MAX);
    }
}
