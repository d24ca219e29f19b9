// matchlog - core/extract.rs
//
// Pulls typed fields out of classified lines: player identity tuples,
// weapons, headshot flags.
//
// All patterns accept either double-quoted tokens (raw server log) or
// single-quoted tokens (sanitized JSON artifacts, where every embedded `"`
// was replaced with `'` before serialisation), so one extractor serves both
// dialects.
//
// Extraction is best-effort: a malformed or partially-matching line yields
// partially-null fields rather than failing the whole line.

use crate::core::classify;
use crate::core::model::{ClassifiedEvent, EventLabel, KillEvent, LogLine, PlayerIdentity};
use regex::Regex;
use std::sync::OnceLock;

/// Bracketed player token grammar: `name<user_id><STEAM_...><TEAM>`,
/// wrapped in either quote style. An empty team tag becomes `None`.
fn player_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"["'](?P<name>[^"'<]+?)<(?P<userid>\d+)><(?P<steam>STEAM_[^>]+)><(?P<team>[^>]*)>["']"#,
        )
        .expect("extract: invalid player regex")
    })
}

fn weapon_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"with ["'](?P<weapon>[^"']+)["']"#).expect("extract: invalid weapon regex")
    })
}

fn headshot_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(headshot\)").expect("extract: invalid headshot regex"))
}

/// Extract up to `limit` player identity tuples, in order of appearance.
pub fn extract_players(body: &str, limit: usize) -> Vec<PlayerIdentity> {
    let mut players = Vec::new();
    for caps in player_re().captures_iter(body) {
        let user_id = match caps["userid"].parse::<u32>() {
            Ok(id) => id,
            Err(_) => continue,
        };
        let team = &caps["team"];
        players.push(PlayerIdentity {
            name: caps["name"].to_string(),
            user_id,
            persistent_id: caps["steam"].to_string(),
            team: if team.is_empty() {
                None
            } else {
                Some(team.to_string())
            },
        });
        if players.len() >= limit {
            break;
        }
    }
    players
}

/// Weapon from a `with "<weapon>"` clause, lower-cased.
pub fn extract_weapon(body: &str) -> Option<String> {
    weapon_re()
        .captures(body)
        .map(|caps| caps["weapon"].to_lowercase())
}

/// Presence of the `(headshot)` marker.
pub fn has_headshot_marker(body: &str) -> bool {
    headshot_re().is_match(body)
}

/// True for environmental/self-inflicted death lines (`killed other`),
/// which carry no attacker semantics and must never yield a KillEvent.
pub fn is_world_kill(body: &str) -> bool {
    body.to_lowercase().contains("killed other")
}

/// Classify a tokenized line and enrich it with extracted kill fields.
///
/// Kill-field enrichment fires on any ` killed ` body so that world-kill
/// lines still surface their weapon in the columnar snapshot even though
/// they never become a KillEvent.
pub fn classify_and_extract(line: LogLine) -> ClassifiedEvent {
    let label = classify::classify(&line.body);

    let (attacker, victim, weapon, headshot) = if line.body.contains(" killed ") {
        let mut players = extract_players(&line.body, 2);
        let (attacker, victim) = if players.len() >= 2 {
            let victim = players.pop();
            let attacker = players.pop();
            (attacker, victim)
        } else {
            (None, None)
        };
        (
            attacker,
            victim,
            extract_weapon(&line.body),
            Some(has_headshot_marker(&line.body)),
        )
    } else {
        (None, None, None, None)
    };

    ClassifiedEvent {
        ts: line.ts,
        label,
        body: line.body,
        attacker,
        victim,
        weapon,
        headshot,
    }
}

/// Resolve a classified event into a player-versus-player kill.
///
/// Requires the `killed` label, both player tokens, and a weapon clause;
/// `killed other` lines are rejected regardless of what else matched.
pub fn kill_event(event: &ClassifiedEvent) -> Option<KillEvent> {
    if event.label != EventLabel::Killed || is_world_kill(&event.body) {
        return None;
    }

    Some(KillEvent {
        ts: event.ts,
        attacker: event.attacker.clone()?,
        victim: event.victim.clone()?,
        weapon: event.weapon.clone()?,
        headshot: event.headshot.unwrap_or(false),
    })
}

/// Extract a kill directly from one sanitized artifact line.
///
/// Used when re-aggregating the round-grouped JSON artifact, whose lines
/// kept their timestamp prefix but had quotes sanitized.
pub fn kill_from_line(line: &str) -> Option<KillEvent> {
    let tokenized = crate::core::tokenizer::tokenize(line)?;
    kill_event(&classify_and_extract_sanitized(tokenized))
}

/// Like `classify_and_extract` but classifies on a double-quote-restored
/// copy of the body, so sanitized single-quoted lines label identically to
/// their raw originals.
pub fn classify_and_extract_sanitized(line: LogLine) -> ClassifiedEvent {
    let restored = line.body.replace('\'', "\"");
    let mut event = classify_and_extract(LogLine {
        ts: line.ts,
        body: restored,
    });
    event.body = line.body;
    event
}
