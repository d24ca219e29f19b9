// matchlog - core/tokenizer.rs
//
// Splits a raw console-log line into (timestamp, message body).
//
// Two timestamp prefix dialects exist: the standard server log writes a
// strict `MM/DD/YYYY - HH:MM:SS: ` prefix, while overlay-tagged lines are
// looser about separator spacing and zero-padding. Both parse to the same
// second-resolution wall-clock timestamp; no timezone conversion happens.
//
// Failure policy: lines without a recognisable prefix are skipped, not
// reported — the log contains diagnostic/engine lines with no timestamp.

use crate::core::model::LogLine;
use crate::util::constants::LOG_TS_FORMAT;
use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::OnceLock;

/// Strict standard-log prefix: `11/28/2021 - 20:05:10: body`.
fn strict_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<date>\d{2}/\d{2}/\d{4}) - (?P<time>\d{2}:\d{2}:\d{2}): (?P<body>.*)$")
            .expect("tokenizer: invalid strict regex")
    })
}

/// Lenient overlay-dialect prefix: tolerates single-digit date fields and
/// variable whitespace around the dash and after the colon.
fn lenient_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?P<date>\d{1,2}/\d{1,2}/\d{4})\s*-\s*(?P<time>\d{2}:\d{2}:\d{2}):\s*(?P<body>.*)$",
        )
        .expect("tokenizer: invalid lenient regex")
    })
}

/// Tokenize one raw line. Returns `None` when no timestamp prefix matches
/// or the matched prefix is not a real calendar date.
pub fn tokenize(line: &str) -> Option<LogLine> {
    let line = line.trim_end_matches(['\r', '\n']);
    let caps = strict_re()
        .captures(line)
        .or_else(|| lenient_re().captures(line))?;

    let raw_ts = format!("{} - {}", &caps["date"], &caps["time"]);
    let ts = NaiveDateTime::parse_from_str(&raw_ts, LOG_TS_FORMAT).ok()?;

    Some(LogLine {
        ts,
        body: caps["body"].to_string(),
    })
}

/// Extract just the timestamp from a line, without allocating the body.
///
/// Used by the stages that scope a full raw capture to a match window and
/// only need per-line timestamps for the range comparison.
pub fn line_timestamp(line: &str) -> Option<NaiveDateTime> {
    let caps = strict_re()
        .captures(line)
        .or_else(|| lenient_re().captures(line))?;
    let raw_ts = format!("{} - {}", &caps["date"], &caps["time"]);
    NaiveDateTime::parse_from_str(&raw_ts, LOG_TS_FORMAT).ok()
}

/// Parse a bare `MM/DD/YYYY - HH:MM:SS` string, as stored in the match
/// window artifact.
pub fn parse_ts(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), LOG_TS_FORMAT).ok()
}
