//! Header normalization.
//!
//! Pure functions that pull the indexed fields out of a raw header list.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};

use crate::errors::CodecError;
use mail_indexer_shared::{MailDocument, MailHeader};

/// Header values that mark a message as authenticated. Matched case-insensitively.
pub const SECURITY_MARKERS: [&str; 3] = ["spf=pass", "dkim=pass", "dmarc=pass"];

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Digits accepted for the day of month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayDigits {
    /// `02`
    Two,
    /// `2`, which also takes `02`.
    OneOrTwo,
}

/// How the zone at the end of a timestamp is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneStyle {
    /// `-0700`
    Numeric,
    /// `-0700 (MST)`; the name is validated, the numeric offset is used.
    NumericWithComment,
    /// `MST`; recorded at zero offset, except `GMT+h`.
    Abbreviation,
}

/// One accepted timestamp layout: `[Mon, ]02 Jan 2006 15:04:05 <zone>`.
///
/// Hours take one or two digits, minutes and seconds exactly two. A `.` or
/// `,` fraction may follow the seconds.
#[derive(Debug, Clone, Copy)]
pub struct TimestampFormat {
    day: DayDigits,
    zone: ZoneStyle,
    /// Whether the value starts with `Mon, `.
    weekday: bool,
}

impl TimestampFormat {
    pub const fn new(day: DayDigits, zone: ZoneStyle) -> Self {
        Self {
            day,
            zone,
            weekday: false,
        }
    }

    /// Require a leading weekday abbreviation. It is checked for syntax only.
    pub const fn after_weekday(mut self) -> Self {
        self.weekday = true;
        self
    }

    /// Try to parse `raw` with this layout.
    pub fn parse(&self, raw: &str) -> Option<DateTime<FixedOffset>> {
        let mut input = raw.trim();
        if self.weekday {
            input = strip_weekday(input)?;
        }

        let mut tokens = input.split(' ').filter(|t| !t.is_empty());

        let day = match self.day {
            DayDigits::Two => digits(tokens.next()?, 2, 2)?,
            DayDigits::OneOrTwo => digits(tokens.next()?, 1, 2)?,
        };
        let month = month_number(tokens.next()?)?;
        let year = digits(tokens.next()?, 4, 4)?;
        let time = parse_clock(tokens.next()?)?;

        let offset = match self.zone {
            ZoneStyle::Numeric => numeric_offset(tokens.next()?)?,
            ZoneStyle::NumericWithComment => {
                let offset = numeric_offset(tokens.next()?)?;
                let comment = tokens.next()?.strip_prefix('(')?.strip_suffix(')')?;
                zone_name_offset(comment)?;
                offset
            }
            ZoneStyle::Abbreviation => zone_name_offset(tokens.next()?)?,
        };

        if tokens.next().is_some() {
            return None;
        }

        NaiveDate::from_ymd_opt(year as i32, month, day)?
            .and_time(time)
            .and_local_timezone(offset)
            .single()
    }
}

impl fmt::Display for TimestampFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.weekday {
            f.write_str("Mon, ")?;
        }
        f.write_str(match self.day {
            DayDigits::Two => "02",
            DayDigits::OneOrTwo => "2",
        })?;
        f.write_str(" Jan 2006 15:04:05")?;
        f.write_str(match self.zone {
            ZoneStyle::Numeric => " -0700",
            ZoneStyle::NumericWithComment => " -0700 (MST)",
            ZoneStyle::Abbreviation => " MST",
        })
    }
}

/// Accepted `Date` header layouts, tried in order.
pub const TIMESTAMP_FORMATS: [TimestampFormat; 8] = [
    TimestampFormat::new(DayDigits::Two, ZoneStyle::Abbreviation).after_weekday(),
    TimestampFormat::new(DayDigits::Two, ZoneStyle::Numeric).after_weekday(),
    TimestampFormat::new(DayDigits::Two, ZoneStyle::NumericWithComment).after_weekday(),
    TimestampFormat::new(DayDigits::Two, ZoneStyle::Numeric).after_weekday(),
    TimestampFormat::new(DayDigits::OneOrTwo, ZoneStyle::NumericWithComment).after_weekday(),
    TimestampFormat::new(DayDigits::OneOrTwo, ZoneStyle::Numeric).after_weekday(),
    TimestampFormat::new(DayDigits::Two, ZoneStyle::Numeric),
    TimestampFormat::new(DayDigits::OneOrTwo, ZoneStyle::Numeric),
];

/// Value of the first header named `name`, compared case-insensitively.
pub fn header_value<'a>(headers: &'a [MailHeader], name: &str) -> Result<&'a str, CodecError> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
        .ok_or_else(|| CodecError::HeaderNotFound(name.to_string()))
}

/// Parse a `Date` header with [`TIMESTAMP_FORMATS`].
pub fn parse_date(raw: &str) -> Result<DateTime<FixedOffset>, CodecError> {
    parse_date_with(&TIMESTAMP_FORMATS, raw)
}

/// Parse with the first of `formats` that accepts `raw`.
pub fn parse_date_with(
    formats: &[TimestampFormat],
    raw: &str,
) -> Result<DateTime<FixedOffset>, CodecError> {
    formats
        .iter()
        .find_map(|format| format.parse(raw))
        .ok_or_else(|| CodecError::DateParseError(raw.to_string()))
}

/// Whether any header value, whatever its name, reports an SPF, DKIM or DMARC pass.
pub fn is_secure(headers: &[MailHeader]) -> bool {
    headers.iter().any(|header| {
        let value = header.value.to_lowercase();
        SECURITY_MARKERS.iter().any(|marker| value.contains(marker))
    })
}

/// Whatever could be extracted from a message that failed normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialDocument {
    pub from: Option<String>,
    pub to: Option<String>,
    pub date: Option<DateTime<FixedOffset>>,
    pub subject: Option<String>,
    pub secure: bool,
}

/// A message that cannot become a document, with every reason found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedMessage {
    pub partial: PartialDocument,
    pub problems: Vec<CodecError>,
}

impl fmt::Display for RejectedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, problem) in self.problems.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", problem)?;
        }
        Ok(())
    }
}

/// Build a document from a header list.
///
/// All four of `from`, `to`, `date` and `subject` must be present and the date
/// must parse; otherwise nothing is built and every problem is reported.
pub fn normalize(headers: &[MailHeader]) -> Result<MailDocument, RejectedMessage> {
    let mut problems = Vec::new();
    let mut take = |name: &str| match header_value(headers, name) {
        Ok(value) => Some(value.to_string()),
        Err(e) => {
            problems.push(e);
            None
        }
    };

    let from = take("from");
    let to = take("to");
    let raw_date = take("date");
    let subject = take("subject");

    let date = raw_date.as_deref().and_then(|raw| match parse_date(raw) {
        Ok(date) => Some(date),
        Err(e) => {
            problems.push(e);
            None
        }
    });

    let secure = is_secure(headers);

    match (from, to, date, subject) {
        (Some(from), Some(to), Some(date), Some(subject)) if problems.is_empty() => {
            Ok(MailDocument::new(from, to, date, subject, secure))
        }
        (from, to, date, subject) => Err(RejectedMessage {
            partial: PartialDocument {
                from,
                to,
                date,
                subject,
                secure,
            },
            problems,
        }),
    }
}

fn strip_weekday(input: &str) -> Option<&str> {
    const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
    let (day, rest) = input.split_once(", ")?;
    WEEKDAYS
        .iter()
        .any(|d| d.eq_ignore_ascii_case(day))
        .then_some(rest)
}

/// `token` as a number of `min..=max` ASCII digits.
fn digits(token: &str, min: usize, max: usize) -> Option<u32> {
    if !(min..=max).contains(&token.len()) || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

fn month_number(token: &str) -> Option<u32> {
    MONTHS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(token))
        .map(|i| i as u32 + 1)
}

/// `15:04:05`, optionally followed by `.999` or `,999`.
fn parse_clock(token: &str) -> Option<NaiveTime> {
    let mut parts = token.splitn(3, ':');
    let hour = digits(parts.next()?, 1, 2)?;
    let minute = digits(parts.next()?, 2, 2)?;

    let rest = parts.next()?;
    let (seconds, fraction) = match rest.find(['.', ',']) {
        Some(i) => (&rest[..i], Some(&rest[i + 1..])),
        None => (rest, None),
    };
    let second = digits(seconds, 2, 2)?;
    let nanos = match fraction {
        Some(fraction) => nanoseconds(fraction)?,
        None => 0,
    };

    NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)
}

/// Fraction digits as nanoseconds; digits past the ninth are ignored.
fn nanoseconds(fraction: &str) -> Option<u32> {
    if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let kept = &fraction[..fraction.len().min(9)];
    let value: u32 = kept.parse().ok()?;
    Some(value * 10u32.pow((9 - kept.len()) as u32))
}

/// `-0700`. Colon forms are not accepted.
fn numeric_offset(token: &str) -> Option<FixedOffset> {
    let sign = match token.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let body = &token[1..];
    if body.len() != 4 {
        return None;
    }
    let hours = digits(&body[..2], 2, 2)? as i32;
    let minutes = digits(&body[2..], 2, 2)? as i32;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Offset implied by a zone name, or `None` if it is not one.
///
/// Names carry no offset of their own except `GMT+h` / `GMT-h`.
fn zone_name_offset(name: &str) -> Option<FixedOffset> {
    if let Some(rest) = name.strip_prefix("GMT") {
        if rest.is_empty() {
            return FixedOffset::east_opt(0);
        }
        return FixedOffset::east_opt(signed_hours(rest)? * 3600);
    }

    if name.starts_with(['+', '-']) {
        signed_hours(name)?;
        return FixedOffset::east_opt(0);
    }

    if is_zone_abbreviation(name) {
        FixedOffset::east_opt(0)
    } else {
        None
    }
}

/// `+3`, `-11`: a signed whole number of hours below 24.
fn signed_hours(token: &str) -> Option<i32> {
    let sign = match token.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let hours = digits(&token[1..], 1, 2)? as i32;
    (hours < 24).then_some(sign * hours)
}

/// Three upper-case letters, four or five ending in `T`, or one of the
/// mixed-case names in use.
fn is_zone_abbreviation(zone: &str) -> bool {
    if matches!(zone, "ChST" | "MeST" | "WITA") {
        return true;
    }
    if !zone.bytes().all(|b| b.is_ascii_uppercase()) {
        return false;
    }
    match zone.len() {
        3 => true,
        4 | 5 => zone.ends_with('T'),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn header(name: &str, value: &str) -> MailHeader {
        MailHeader::new(name, value)
    }

    fn valid_headers() -> Vec<MailHeader> {
        vec![
            header("Received", "from mx.example.com"),
            header("From", "Alice <alice@example.com>"),
            header("To", "bob@example.com"),
            header("Date", "Tue, 15 Nov 2022 08:12:31 -0800"),
            header("Subject", "Lunch?"),
        ]
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let headers = valid_headers();
        assert_eq!(header_value(&headers, "from").unwrap(), "Alice <alice@example.com>");
        assert_eq!(header_value(&headers, "SUBJECT").unwrap(), "Lunch?");
    }

    #[test]
    fn test_header_lookup_returns_first_match() {
        let headers = vec![
            header("X-Tag", "first"),
            header("x-tag", "second"),
            header("X-TAG", "third"),
        ];
        assert_eq!(header_value(&headers, "x-tag").unwrap(), "first");
    }

    #[test]
    fn test_header_lookup_not_found() {
        let headers = valid_headers();
        assert_eq!(
            header_value(&headers, "Cc"),
            Err(CodecError::HeaderNotFound("Cc".to_string()))
        );
        assert!(header_value(&headers, "cc").is_err());
        assert!(header_value(&[], "from").is_err());
    }

    #[test]
    fn test_parse_rfc1123z() {
        let date = parse_date("Tue, 15 Nov 2022 08:12:31 -0800").unwrap();
        assert_eq!(date.to_rfc3339(), "2022-11-15T08:12:31-08:00");
    }

    #[test]
    fn test_parse_zone_abbreviation() {
        let date = parse_date("Tue, 15 Nov 2022 08:12:31 GMT").unwrap();
        assert_eq!(date.offset().local_minus_utc(), 0);
        assert_eq!(date.hour(), 8);
    }

    #[test]
    fn test_parse_with_zone_comment() {
        let date = parse_date("Wed, 02 Mar 2016 17:30:00 +0100 (CET)").unwrap();
        assert_eq!(date.to_rfc3339(), "2016-03-02T17:30:00+01:00");

        let date = parse_date("Wed, 2 Mar 2016 17:30:00 +0100 (CET)").unwrap();
        assert_eq!(date.day(), 2);
    }

    #[test]
    fn test_parse_single_digit_day() {
        let date = parse_date("Fri, 3 Jan 2020 23:59:59 +0000").unwrap();
        assert_eq!(date.day(), 3);
        assert_eq!(date.hour(), 23);
    }

    #[test]
    fn test_parse_without_weekday() {
        let date = parse_date("02 Jan 2006 15:04:05 -0700").unwrap();
        assert_eq!(date.to_rfc3339(), "2006-01-02T15:04:05-07:00");

        let date = parse_date("2 Jan 2006 15:04:05 -0700").unwrap();
        assert_eq!(date.day(), 2);
    }

    #[test]
    fn test_weekday_is_not_cross_checked() {
        // 2 Jan 2006 was a Monday
        let date = parse_date("Fri, 02 Jan 2006 15:04:05 -0700").unwrap();
        assert_eq!(date.weekday(), chrono::Weekday::Mon);
    }

    #[test]
    fn test_parse_rejects_unknown_layouts() {
        for raw in [
            "",
            "yesterday",
            "2022-11-15T08:12:31Z",
            "Xyz, 15 Nov 2022 08:12:31 -0800",
            "Tue, 15 Nov 2022 08:12:31 pst",
        ] {
            assert_eq!(
                parse_date(raw),
                Err(CodecError::DateParseError(raw.to_string())),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_first_accepting_format_is_used() {
        let raw = "Mon, 02 Jan 2006 15:04:05 -0700";
        let accepting: Vec<usize> = TIMESTAMP_FORMATS
            .iter()
            .enumerate()
            .filter(|(_, format)| format.parse(raw).is_some())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(accepting, vec![1, 3, 5]);
        assert_eq!(parse_date(raw), Ok(TIMESTAMP_FORMATS[1].parse(raw).unwrap()));

        assert!(parse_date_with(&TIMESTAMP_FORMATS[6..], raw).is_err());
    }

    #[test]
    fn test_zone_comment_must_be_abbreviation() {
        for raw in [
            "Thu, 01 Jun 2023 09:00:00 +0000 (Coordinated Universal Time)",
            "Thu, 01 Jun 2023 09:00:00 +0000 (utc)",
            "Thu, 01 Jun 2023 09:00:00 +0000 ()",
        ] {
            assert!(parse_date(raw).is_err(), "{raw}");
        }

        let date = parse_date("Thu, 01 Jun 2023 09:00:00 +1000 (AEST)").unwrap();
        assert_eq!(date.offset().local_minus_utc(), 36_000);
    }

    #[test]
    fn test_two_digit_day_layouts() {
        assert!(parse_date("Mon, 2 Jan 2006 15:04:05 MST").is_err());
        assert!(parse_date("Mon, 002 Jan 2006 15:04:05 -0700").is_err());
        // one-digit layouts still take a padded day
        assert!(TIMESTAMP_FORMATS[7].parse("02 Jan 2006 15:04:05 -0700").is_some());
    }

    #[test]
    fn test_colon_offset_rejected() {
        assert!(parse_date("Mon, 02 Jan 2006 15:04:05 +07:00").is_err());
        assert!(parse_date("Mon, 02 Jan 2006 15:04:05 +07").is_ok());
        assert!(parse_date("Mon, 02 Jan 2006 15:04:05 +070").is_err());
    }

    #[test]
    fn test_fractional_seconds_accepted() {
        let date = parse_date("Tue, 15 Nov 2022 08:12:31.250 -0800").unwrap();
        assert_eq!(date.second(), 31);
        assert_eq!(date.nanosecond(), 250_000_000);

        let date = parse_date("15 Nov 2022 08:12:31,5 -0800").unwrap();
        assert_eq!(date.nanosecond(), 500_000_000);

        assert!(parse_date("Tue, 15 Nov 2022 08:12:31. -0800").is_err());
    }

    #[test]
    fn test_clock_digits() {
        let date = parse_date("Tue, 15 Nov 2022 8:12:31 -0800").unwrap();
        assert_eq!(date.hour(), 8);

        assert!(parse_date("Tue, 15 Nov 2022 08:2:31 -0800").is_err());
        assert!(parse_date("Tue, 15 Nov 2022 08:12:3 -0800").is_err());
        assert!(parse_date("Tue, 15 Nov 2022 24:00:00 -0800").is_err());
    }

    #[test]
    fn test_zone_names() {
        for zone in ["UTC", "GMT", "AEST", "CEST", "ChST", "+07"] {
            let raw = format!("Tue, 15 Nov 2022 08:12:31 {zone}");
            let date = parse_date(&raw).unwrap();
            assert_eq!(date.offset().local_minus_utc(), 0, "{raw}");
        }

        let date = parse_date("Tue, 15 Nov 2022 08:12:31 GMT+3").unwrap();
        assert_eq!(date.offset().local_minus_utc(), 3 * 3600);

        for zone in ["ABCD", "PACIFIC", "Pst", "GMT+30"] {
            let raw = format!("Tue, 15 Nov 2022 08:12:31 {zone}");
            assert!(parse_date(&raw).is_err(), "{raw}");
        }
    }

    #[test]
    fn test_day_out_of_range() {
        assert!(parse_date("Mon, 31 Feb 2022 10:00:00 +0000").is_err());
        assert!(parse_date("Tue, 29 Feb 2024 10:00:00 +0000").is_ok());
    }

    #[test]
    fn test_format_display() {
        assert_eq!(TIMESTAMP_FORMATS[0].to_string(), "Mon, 02 Jan 2006 15:04:05 MST");
        assert_eq!(TIMESTAMP_FORMATS[4].to_string(), "Mon, 2 Jan 2006 15:04:05 -0700 (MST)");
        assert_eq!(TIMESTAMP_FORMATS[7].to_string(), "2 Jan 2006 15:04:05 -0700");
    }

    #[test]
    fn test_secure_markers_in_any_header() {
        let headers = vec![header("X-Custom", "result: DKIM=Pass header.d=example.com")];
        assert!(is_secure(&headers));

        let headers = vec![header("Authentication-Results", "mx.google.com; spf=pass")];
        assert!(is_secure(&headers));

        let headers = vec![header("ARC-Authentication-Results", "i=1; dmarc=pass (p=NONE)")];
        assert!(is_secure(&headers));
    }

    #[test]
    fn test_not_secure() {
        let headers = vec![
            header("Authentication-Results", "spf=fail; dkim=none; dmarc=softfail"),
            header("spf=pass", "name is not scanned"),
        ];
        assert!(!is_secure(&headers));
        assert!(!is_secure(&[]));
    }

    #[test]
    fn test_normalize_valid_message() {
        let mut headers = valid_headers();
        headers.push(header("Authentication-Results", "spf=pass"));

        let doc = normalize(&headers).unwrap();
        assert_eq!(doc.from, "Alice <alice@example.com>");
        assert_eq!(doc.to, "bob@example.com");
        assert_eq!(doc.subject, "Lunch?");
        assert_eq!(doc.hour_of_day, 8);
        assert_eq!(doc.day_of_week, "Tuesday");
        assert!(doc.secure);
    }

    #[test]
    fn test_normalize_missing_to() {
        let headers: Vec<_> = valid_headers()
            .into_iter()
            .filter(|h| !h.name.eq_ignore_ascii_case("to"))
            .collect();

        let rejected = normalize(&headers).unwrap_err();
        assert_eq!(rejected.problems, vec![CodecError::HeaderNotFound("to".to_string())]);
        assert_eq!(rejected.partial.from.as_deref(), Some("Alice <alice@example.com>"));
        assert!(rejected.partial.to.is_none());
        assert!(rejected.partial.date.is_some());
    }

    #[test]
    fn test_normalize_reports_every_problem() {
        let headers = vec![
            header("From", "alice@example.com"),
            header("Date", "not a date"),
        ];

        let rejected = normalize(&headers).unwrap_err();
        assert_eq!(
            rejected.problems,
            vec![
                CodecError::HeaderNotFound("to".to_string()),
                CodecError::HeaderNotFound("subject".to_string()),
                CodecError::DateParseError("not a date".to_string()),
            ]
        );
        assert_eq!(
            rejected.to_string(),
            "header [to] not found; header [subject] not found; unable to parse date [not a date]"
        );
    }
}
