// Date Format Utilities
// Converts `yyyyMMddHHmmss`-style format strings to chrono strftime

use chrono::{DateTime, Utc};
use std::time::SystemTime;

/// A parsed date format
///
/// Supported tokens: `yyyy yy MMMM MMM MM M dddd ddd dd d HH H hh h mm m ss s fff tt`.
/// Text inside single quotes and characters after `\` are copied literally,
/// every other character is copied as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat {
    pattern: String,
    strftime: String,
}

impl DateFormat {
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            strftime: to_strftime(pattern),
        }
    }

    /// The original format string
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The equivalent chrono strftime string
    pub fn strftime(&self) -> &str {
        &self.strftime
    }

    /// Format a UTC timestamp
    pub fn format(&self, time: DateTime<Utc>) -> String {
        time.format(&self.strftime).to_string()
    }

    /// Format a file-system timestamp, interpreted as UTC
    pub fn format_system_time(&self, time: SystemTime) -> String {
        self.format(DateTime::<Utc>::from(time))
    }
}

fn to_strftime(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            i += 1;
            while i < chars.len() && chars[i] != '\'' {
                push_literal(&mut out, chars[i]);
                i += 1;
            }
            i += 1; // closing quote
            continue;
        }

        if c == '\\' {
            if let Some(&next) = chars.get(i + 1) {
                push_literal(&mut out, next);
            }
            i += 2;
            continue;
        }

        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == c {
            run += 1;
        }

        let spec = match (c, run) {
            ('y', 1..=2) => Some("%y"),
            ('y', _) => Some("%Y"),
            ('M', 1) => Some("%-m"),
            ('M', 2) => Some("%m"),
            ('M', 3) => Some("%b"),
            ('M', _) => Some("%B"),
            ('d', 1) => Some("%-d"),
            ('d', 2) => Some("%d"),
            ('d', 3) => Some("%a"),
            ('d', _) => Some("%A"),
            ('H', 1) => Some("%-H"),
            ('H', _) => Some("%H"),
            ('h', 1) => Some("%-I"),
            ('h', _) => Some("%I"),
            ('m', 1) => Some("%-M"),
            ('m', _) => Some("%M"),
            ('s', 1) => Some("%-S"),
            ('s', _) => Some("%S"),
            ('f', 1..=3) => Some("%3f"),
            ('f', 4..=6) => Some("%6f"),
            ('f', _) => Some("%9f"),
            ('t', _) => Some("%p"),
            _ => None,
        };

        match spec {
            Some(spec) => out.push_str(spec),
            None => (0..run).for_each(|_| push_literal(&mut out, c)),
        }
        i += run;
    }

    out
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 7, 15, 4, 9).unwrap()
    }

    #[test]
    fn test_compact_format() {
        let format = DateFormat::new("yyyyMMddHHmmss");
        assert_eq!(format.strftime(), "%Y%m%d%H%M%S");
        assert_eq!(format.format(sample()), "20240307150409");
    }

    #[test]
    fn test_twelve_hour_clock() {
        let format = DateFormat::new("yyyyMMddhhmmss");
        assert_eq!(format.format(sample()), "20240307030409");
    }

    #[test]
    fn test_literals_and_separators() {
        let format = DateFormat::new("yyyy-MM-dd'T'HH.mm 100%");
        assert_eq!(format.format(sample()), "2024-03-07T15.04 100%");
    }

    #[test]
    fn test_escaped_token_character() {
        let format = DateFormat::new(r"yyyy\y");
        assert_eq!(format.format(sample()), "2024y");
    }

    #[test]
    fn test_system_time() {
        let time = SystemTime::from(sample());
        assert_eq!(DateFormat::new("yyMd").format_system_time(time), "2437");
    }
}
