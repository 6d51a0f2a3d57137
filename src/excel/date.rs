use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Calendar origin used when dates are stored as numeric serials.
///
/// `Excel1900` reproduces the phantom 1900-02-29 (serial 60) inherited from Lotus 1-2-3.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateSystem {
    #[default]
    Excel1900,
    Excel1904,
}

impl DateSystem {
    pub fn from_1904_flag(date1904: bool) -> Self {
        if date1904 {
            DateSystem::Excel1904
        } else {
            DateSystem::Excel1900
        }
    }

    pub fn is_1904(self) -> bool {
        self == DateSystem::Excel1904
    }

    /// Convert a timestamp into a date serial (whole days plus a day fraction).
    pub fn to_serial(self, value: NaiveDateTime) -> f64 {
        let days = (value.date() - self.epoch(61)).num_days();
        let days = match self {
            DateSystem::Excel1900 if days < 61 => days - 1,
            _ => days,
        };
        let millis = value.time().num_seconds_from_midnight() as f64 * 1000.0
            + (value.time().nanosecond() / 1_000_000) as f64;
        days as f64 + millis / MILLIS_PER_DAY
    }

    /// Convert a date serial back into a timestamp, rounded to the millisecond.
    pub fn from_serial(self, serial: f64) -> Option<NaiveDateTime> {
        if !serial.is_finite() || serial < 0.0 {
            return None;
        }

        let whole_days = serial.trunc() as i64;
        let mut millis = (serial.fract() * MILLIS_PER_DAY).round() as i64;
        let mut date = self.epoch(whole_days).checked_add_signed(Duration::days(whole_days))?;
        if millis >= MILLIS_PER_DAY as i64 {
            millis -= MILLIS_PER_DAY as i64;
            date = date.succ_opt()?;
        }

        date.and_hms_opt(0, 0, 0)?
            .checked_add_signed(Duration::milliseconds(millis))
    }

    fn epoch(self, serial_days: i64) -> NaiveDate {
        // Both dates are valid calendar dates; the fallbacks are never taken.
        match self {
            DateSystem::Excel1904 => NaiveDate::from_ymd_opt(1904, 1, 1).unwrap_or_default(),
            DateSystem::Excel1900 if serial_days < 61 => {
                NaiveDate::from_ymd_opt(1899, 12, 31).unwrap_or_default()
            }
            DateSystem::Excel1900 => NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default(),
        }
    }
}

/// Render a timestamp as ISO-8601, dropping the time part at midnight.
pub fn format_iso(value: &NaiveDateTime) -> String {
    if value.time().num_seconds_from_midnight() == 0 && value.time().nanosecond() == 0 {
        value.format("%Y-%m-%d").to_string()
    } else if value.time().nanosecond() == 0 {
        value.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        value.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
    }
}

/// Whether a number format code renders its value as a date or time.
pub fn is_date_format(code: &str) -> bool {
    let mut in_quotes = false;
    let mut in_brackets = false;
    let mut escaped = false;

    for c in code.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => in_quotes = !in_quotes,
            '[' if !in_quotes => in_brackets = true,
            ']' if !in_quotes => in_brackets = false,
            // `General` contains an `e` but is never a date.
            'G' | 'g' if !in_quotes && !in_brackets => return false,
            'y' | 'Y' | 'm' | 'M' | 'd' | 'D' | 'h' | 'H' | 's' | 'S'
                if !in_quotes && !in_brackets =>
            {
                return true;
            }
            _ => {}
        }
    }

    false
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DateToken {
    Literal(String),
    /// A run of one of `y m d h s`, lowercased, with its length.
    Part(char, usize),
    Meridiem { short: bool },
}

/// Render a timestamp through a number format code such as `yyyy-mm-dd`
/// or `d mmm h:mm AM/PM`.
///
/// `m`/`mm` mean minutes right after an hour part or right before a
/// seconds part. Bracketed sections (colors, locales) are skipped and
/// quoted or escaped text is copied through.
pub fn format_date(value: &NaiveDateTime, code: &str) -> String {
    let tokens = tokenize_date_format(code);
    let twelve_hour = tokens.iter().any(|t| matches!(t, DateToken::Meridiem { .. }));

    let mut out = String::new();
    for (idx, token) in tokens.iter().enumerate() {
        match token {
            DateToken::Literal(text) => out.push_str(text),
            DateToken::Meridiem { short } => {
                let label = match (short, value.hour() >= 12) {
                    (false, false) => "AM",
                    (false, true) => "PM",
                    (true, false) => "A",
                    (true, true) => "P",
                };
                out.push_str(label);
            }
            DateToken::Part(kind, len) => {
                let minutes = *kind == 'm' && *len <= 2 && is_minutes(&tokens, idx);
                out.push_str(&render_part(value, *kind, *len, minutes, twelve_hour));
            }
        }
    }
    out
}

fn tokenize_date_format(code: &str) -> Vec<DateToken> {
    let chars: Vec<char> = code.chars().collect();
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    let starts_with = |at: usize, word: &str| {
        let len = word.chars().count();
        at + len <= chars.len()
            && chars[at..at + len]
                .iter()
                .zip(word.chars())
                .all(|(a, b)| a.eq_ignore_ascii_case(&b))
    };

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' => {
                let close = chars[i + 1..].iter().position(|&q| q == '"');
                let end = close.map_or(chars.len(), |p| i + 1 + p);
                literal.extend(&chars[i + 1..end]);
                i = end + 1;
                continue;
            }
            '\\' => {
                literal.extend(chars.get(i + 1));
                i += 2;
                continue;
            }
            '[' => {
                let close = chars[i..].iter().position(|&b| b == ']');
                i = close.map_or(chars.len(), |p| i + p + 1);
                continue;
            }
            // Padding and fill directives take the following character.
            '_' => {
                literal.push(' ');
                i += 2;
                continue;
            }
            '*' => {
                i += 2;
                continue;
            }
            _ => {}
        }

        let meridiem = if starts_with(i, "AM/PM") {
            Some((false, 5))
        } else if starts_with(i, "A/P") {
            Some((true, 3))
        } else {
            None
        };
        if let Some((short, width)) = meridiem {
            flush_literal(&mut tokens, &mut literal);
            tokens.push(DateToken::Meridiem { short });
            i += width;
            continue;
        }

        let kind = c.to_ascii_lowercase();
        if matches!(kind, 'y' | 'm' | 'd' | 'h' | 's') {
            let run = chars[i..]
                .iter()
                .take_while(|ch| ch.to_ascii_lowercase() == kind)
                .count();
            flush_literal(&mut tokens, &mut literal);
            tokens.push(DateToken::Part(kind, run));
            i += run;
            continue;
        }

        literal.push(c);
        i += 1;
    }
    flush_literal(&mut tokens, &mut literal);
    tokens
}

fn flush_literal(tokens: &mut Vec<DateToken>, literal: &mut String) {
    if !literal.is_empty() {
        tokens.push(DateToken::Literal(std::mem::take(literal)));
    }
}

fn is_minutes(tokens: &[DateToken], idx: usize) -> bool {
    let part = |token: &DateToken| match token {
        DateToken::Part(kind, _) => Some(*kind),
        _ => None,
    };
    let previous = tokens[..idx].iter().rev().find_map(part);
    let next = tokens[idx + 1..].iter().find_map(part);
    previous == Some('h') || next == Some('s')
}

fn render_part(
    value: &NaiveDateTime,
    kind: char,
    len: usize,
    minutes: bool,
    twelve_hour: bool,
) -> String {
    let pad = |n: u32| if len >= 2 { format!("{n:02}") } else { n.to_string() };
    match (kind, len) {
        ('y', 1 | 2) => format!("{:02}", value.year().rem_euclid(100)),
        ('y', _) => format!("{:04}", value.year()),
        ('m', 1 | 2) if minutes => pad(value.minute()),
        ('m', 1 | 2) => pad(value.month()),
        ('m', 3) => value.format("%b").to_string(),
        ('m', 5) => value.format("%B").to_string().chars().take(1).collect(),
        ('m', _) => value.format("%B").to_string(),
        ('d', 1 | 2) => pad(value.day()),
        ('d', 3) => value.format("%a").to_string(),
        ('d', _) => value.format("%A").to_string(),
        ('h', _) if twelve_hour => pad(match value.hour() % 12 {
            0 => 12,
            hour => hour,
        }),
        ('h', _) => pad(value.hour()),
        ('s', _) => pad(value.second()),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn serials_match_excel_1900_epoch() {
        let sys = DateSystem::Excel1900;
        assert_eq!(sys.to_serial(ymd(1900, 1, 1)), 1.0);
        assert_eq!(sys.to_serial(ymd(1900, 2, 28)), 59.0);
        assert_eq!(sys.to_serial(ymd(1900, 3, 1)), 61.0);
        assert_eq!(sys.to_serial(ymd(2024, 1, 2)), 45293.0);
        assert_eq!(sys.from_serial(45293.5).unwrap(), ymd(2024, 1, 2) + Duration::hours(12));
        assert_eq!(sys.from_serial(1.0).unwrap(), ymd(1900, 1, 1));
    }

    #[test]
    fn serials_match_excel_1904_epoch() {
        let sys = DateSystem::Excel1904;
        assert_eq!(sys.to_serial(ymd(1904, 1, 1)), 0.0);
        assert_eq!(sys.to_serial(ymd(2024, 1, 2)), 43831.0);
        assert_eq!(sys.from_serial(43831.0).unwrap(), ymd(2024, 1, 2));
    }

    #[test]
    fn iso_rendering_drops_midnight() {
        assert_eq!(format_iso(&ymd(2024, 1, 2)), "2024-01-02");
        assert_eq!(
            format_iso(&(ymd(2024, 1, 2) + Duration::seconds(3 * 3600 + 4 * 60 + 5))),
            "2024-01-02T03:04:05"
        );
    }

    #[test]
    fn date_codes_render_each_part() {
        let when = ymd(2024, 3, 5) + Duration::seconds(14 * 3600 + 7 * 60 + 9);
        assert_eq!(format_date(&when, "yyyy-mm-dd"), "2024-03-05");
        assert_eq!(format_date(&when, "m/d/yy"), "3/5/24");
        assert_eq!(format_date(&when, "hh:mm:ss"), "14:07:09");
        assert_eq!(format_date(&when, "d mmm h:mm AM/PM"), "5 Mar 2:07 PM");
        assert_eq!(format_date(&when, "dddd, mmmm d"), "Tuesday, March 5");
        assert_eq!(format_date(&when, "[$-409]mmmmm \"of\" yyyy"), "M of 2024");
        assert_eq!(format_date(&ymd(2024, 3, 5), "h A/P"), "12 A");
    }

    #[test]
    fn date_format_detection_skips_literals() {
        assert!(is_date_format("m/d/yy"));
        assert!(is_date_format("yyyy-mm-dd hh:mm"));
        assert!(is_date_format("[$-409]d-mmm"));
        assert!(!is_date_format("General"));
        assert!(!is_date_format("0.00"));
        assert!(!is_date_format("\"day\" 0"));
        assert!(!is_date_format("[Red]0.00"));
    }
}
