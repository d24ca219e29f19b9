// matchlog - core/classify.rs
//
// Maps a message body to exactly one semantic event label.
//
// Ordered pattern precedence, first match wins:
//   1. triggered "<X>"          -> trigger_<slug(X)>
//   2. "<player>" <verb> "<..>" -> slug(verb)   (player-vs-player/object)
//   3. "<player>" <verb> ...    -> slug(verb)   (player action, no object)
//   4. connection lifecycle / chat substrings   -> fixed label
//   5. anything else            -> other
//
// A "triggered" substring always wins even when a verb pattern would also
// match: world-triggered and player-triggered events share surface
// similarity with verb lines.

use crate::core::model::EventLabel;
use regex::Regex;
use std::sync::OnceLock;

fn triggered_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"triggered "(?P<trigger>[^"]+)""#).expect("classify: invalid triggered regex")
    })
}

/// `"A<...>" killed "B<...>"` — a lowercase verb phrase between two quoted
/// tokens.
fn player_verb_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#""\s*[^"]+?"\s+(?P<verb>[a-z][a-z ]+?)\s+""#)
            .expect("classify: invalid player-verb regex")
    })
}

/// `"A<...>" purchased ...` — a verb phrase after one quoted token, with no
/// second quoted object.
fn player_action_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#""\s*[^"]+?"\s+(?P<verb>[a-z][a-z ]+?)\s+"#)
            .expect("classify: invalid player-action regex")
    })
}

/// Normalize free text to a lowercase underscore-separated identifier.
/// Runs of non-word characters collapse to a single underscore; leading and
/// trailing underscores are trimmed.
pub fn slug(s: &str) -> String {
    static NON_WORD: OnceLock<Regex> = OnceLock::new();
    static UNDERSCORE_RUN: OnceLock<Regex> = OnceLock::new();
    let non_word =
        NON_WORD.get_or_init(|| Regex::new(r"[^\w]+").expect("classify: invalid slug regex"));
    let underscore_run = UNDERSCORE_RUN
        .get_or_init(|| Regex::new(r"_+").expect("classify: invalid underscore regex"));

    let lowered = s.trim().to_lowercase();
    let replaced = non_word.replace_all(&lowered, "_");
    underscore_run
        .replace_all(&replaced, "_")
        .trim_matches('_')
        .to_string()
}

/// Map a verb slug to its closed label variant, keeping the long tail open.
fn verb_label(verb_slug: String) -> EventLabel {
    match verb_slug.as_str() {
        "killed" => EventLabel::Killed,
        "assisted" => EventLabel::Assisted,
        "attacked" => EventLabel::Attacked,
        "purchased" => EventLabel::Purchased,
        "threw" => EventLabel::Threw,
        "dropped" => EventLabel::Dropped,
        "picked_up" => EventLabel::PickedUp,
        _ => EventLabel::Verb(verb_slug),
    }
}

/// Return the stable event label for any message body. Never fails;
/// `EventLabel::Other` is the catch-all.
pub fn classify(body: &str) -> EventLabel {
    if let Some(caps) = triggered_re().captures(body) {
        return EventLabel::Trigger(slug(&caps["trigger"]));
    }

    if let Some(caps) = player_verb_re().captures(body) {
        return verb_label(slug(&caps["verb"]));
    }

    if let Some(caps) = player_action_re().captures(body) {
        return verb_label(slug(&caps["verb"]));
    }

    if body.contains(" connected, address ") {
        return EventLabel::Connect;
    }
    if body.contains(" entered the game") {
        return EventLabel::EnterGame;
    }
    if body.contains(" disconnected") {
        return EventLabel::Disconnect;
    }
    if body.contains(" switched from team ") {
        return EventLabel::TeamSwitch;
    }
    if body.contains(" say ") || body.contains(" say_team ") {
        return EventLabel::Chat;
    }

    EventLabel::Other
}
