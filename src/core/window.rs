// matchlog - core/window.rs
//
// Match-Window Resolver: brackets genuine competitive play by correlating
// administrative markers from the third-party overlay dialect ("FACEIT"
// tagged lines), so every other stage can be scoped to just the match and
// ignore warm-up and post-match chatter.
//
// Markers:
//   - admin "started the match" line  -> window start
//   - "Team ... won" announcement     -> window end + winning team
//   - "Blocked map de_x"              -> map name (first occurrence)
//   - the `[0 - 1]` score marker      -> team names split around it
//   - any `[a - b]` score             -> final score (last occurrence)
//   - `RoundsPlayed: N` status field  -> rounds played (last occurrence;
//     the most recent status is authoritative)

use crate::core::model::MatchWindow;
use crate::core::tokenizer;
use crate::util::constants::LOG_TS_FORMAT;
use regex::Regex;
use std::sync::OnceLock;

fn overlay_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)FACEIT\^*").expect("window: invalid overlay regex"))
}

fn map_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bBlocked map\s+(?P<map>de_[a-z0-9_]+)\b")
            .expect("window: invalid map regex")
    })
}

fn match_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bAdmin\b.*\bstarted the match\b")
            .expect("window: invalid match-start regex")
    })
}

fn win_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bTeam\b.*\bwon\b").expect("window: invalid win regex"))
}

fn winner_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\bTeam\s+(?P<team>"[^"]+"|'[^']+'|.+?)\s+won\b"#)
            .expect("window: invalid winner regex")
    })
}

fn score_value_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[\s*(?P<a>\d+)\s*-\s*(?P<b>\d+)\s*\]").expect("window: invalid score regex")
    })
}

/// The `[0 - 1]` marker that separates the two team names in the overlay's
/// first score announcement.
fn teams_from_score_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?P<left>.+?)\s*\[\s*0\s*-\s*1\s*\]\s*(?P<right>.+)")
            .expect("window: invalid team-split regex")
    })
}

fn rounds_played_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bRoundsPlayed:\s*(?P<rounds>\d+)\b")
            .expect("window: invalid rounds-played regex")
    })
}

fn control_chars_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\x00-\x1F\x7F]").expect("window: invalid control regex"))
}

fn overlay_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\[\s*FACEIT\^*\s*\]").expect("window: invalid overlay-tag regex")
    })
}

/// True when the line carries the overlay tag.
pub fn is_overlay_line(line: &str) -> bool {
    overlay_re().is_match(line)
}

/// Strip overlay tags, quote characters, a leading "Team " prefix and
/// stray punctuation from a raw team-name fragment, then collapse
/// whitespace.
pub fn clean_team_name(raw: &str) -> String {
    let mut s = raw.trim().to_string();
    s = control_chars_re().replace_all(&s, "").into_owned();
    s = overlay_tag_re().replace_all(&s, "").into_owned();

    let trimmed = s.trim();
    let unquoted = if (trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2)
        || (trimmed.starts_with('\'') && trimmed.ends_with('\'') && trimmed.len() >= 2)
    {
        trimmed[1..trimmed.len() - 1].trim()
    } else {
        trimmed
    };

    let without_prefix = unquoted
        .strip_prefix("Team ")
        .or_else(|| unquoted.strip_prefix("team "))
        .unwrap_or(unquoted);

    let stripped = without_prefix.trim_matches(|c: char| " \t\r\n|:-.!,\"'".contains(c));
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split the free text around the `[0 - 1]` marker into two cleaned team
/// names. Rejected (None) when either side cleans down to fewer than two
/// characters.
fn teams_from_score_line(body: &str) -> Option<(String, String)> {
    let caps = teams_from_score_re().captures(body)?;

    // The left fragment often carries a "something:" prefix; keep only the
    // text after the last colon.
    let left = caps["left"].rsplit(':').next().unwrap_or("").trim();
    let right = &caps["right"];

    let team_1 = clean_team_name(left);
    let team_2 = clean_team_name(right);

    if team_1.chars().count() < 2 || team_2.chars().count() < 2 {
        return None;
    }
    Some((team_1, team_2))
}

/// Strip the timestamp prefix from a line, returning the message payload.
fn payload(line: &str) -> &str {
    match tokenizer::tokenize(line) {
        Some(_) => line
            .splitn(4, ':')
            .nth(3)
            .map(str::trim)
            .unwrap_or(line.trim()),
        None => line.trim(),
    }
}

/// Resolve the match window from the full raw line set.
///
/// Only overlay-tagged lines contribute markers, except `RoundsPlayed`
/// which lives in the engine's own status-line family and is scanned over
/// everything.
pub fn resolve_window(lines: &[String]) -> MatchWindow {
    let mut window = MatchWindow::default();

    for line in lines {
        if let Some(caps) = rounds_played_re().captures(line) {
            // Keep the last seen value: the final status is authoritative.
            if let Ok(rounds) = caps["rounds"].parse::<u32>() {
                window.total_rounds = Some(rounds);
            }
        }

        if !is_overlay_line(line) {
            continue;
        }

        if window.map.is_none() {
            if let Some(caps) = map_re().captures(line) {
                window.map = Some(caps["map"].to_lowercase());
            }
        }

        if window.start_dt.is_none() && match_start_re().is_match(line) {
            if let Some(ts) = tokenizer::line_timestamp(line) {
                window.start_dt = Some(ts.format(LOG_TS_FORMAT).to_string());
                window
                    .date
                    .get_or_insert_with(|| ts.format("%m/%d/%Y").to_string());
            }
        }

        if window.team_1.is_none() && window.team_2.is_none() {
            if let Some((team_1, team_2)) = teams_from_score_line(payload(line)) {
                window.team_1 = Some(team_1);
                window.team_2 = Some(team_2);
            }
        }

        if win_line_re().is_match(line) {
            if let Some(ts) = tokenizer::line_timestamp(line) {
                window.end_dt = Some(ts.format(LOG_TS_FORMAT).to_string());
                window
                    .date
                    .get_or_insert_with(|| ts.format("%m/%d/%Y").to_string());
            }
            if let Some(caps) = winner_re().captures(line) {
                let cleaned = clean_team_name(&caps["team"]);
                if !cleaned.is_empty() {
                    window.winning_team = Some(cleaned);
                }
            }
        }

        if let Some(caps) = score_value_re().captures(line) {
            window.final_score = Some(format!("{}-{}", &caps["a"], &caps["b"]));
        }
    }

    window.match_length = match_length_pretty(&window.start_dt, &window.end_dt);

    tracing::debug!(
        start = ?window.start_dt,
        end = ?window.end_dt,
        map = ?window.map,
        rounds = ?window.total_rounds,
        "Match window resolved"
    );
    window
}

/// Pretty `HH:MM:SS` duration between the window's bracket timestamps.
/// None when either end is missing, unparseable, or the span is negative.
fn match_length_pretty(start_dt: &Option<String>, end_dt: &Option<String>) -> Option<String> {
    let start = tokenizer::parse_ts(start_dt.as_deref()?)?;
    let end = tokenizer::parse_ts(end_dt.as_deref()?)?;

    let seconds = (end - start).num_seconds();
    if seconds < 0 {
        return None;
    }
    Some(format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    ))
}
