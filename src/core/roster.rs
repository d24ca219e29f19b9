// matchlog - core/roster.rs
//
// Reconstructs team rosters at the match-start and match-end instants and
// collects accolade announcement lines.
//
// Rosters are inferred from item-interaction lines (`dropped` / `picked up`)
// because those carry the player's side tag at that moment. Team display
// names come from the most recent `MatchStatus: Team playing` line at or
// before the target instant, which keeps names correct across side swaps.

use crate::core::model::{RosterDocument, Side, TeamSnapshot};
use crate::core::tokenizer;
use crate::util::constants::ROSTER_SIZE_PER_SIDE;
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn team_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"MatchStatus:\s*Team playing\s*["'](?P<side>CT|TERRORIST)["']\s*:\s*(?P<name>.+?)\s*$"#)
            .expect("roster: invalid team-name regex")
    })
}

/// Item-interaction line with a side tag, in either quote style.
fn player_side_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"^.*:\s*["'](?P<player>[^"'<]+?)<\d+><[^>]*><(?P<side>CT|TERRORIST)>["']\s+(?:dropped|picked up)\s+["'].+?["']\s*$"#,
        )
        .expect("roster: invalid player-side regex")
    })
}

fn accolade_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bACCOLADE\b").expect("roster: invalid accolade regex"))
}

/// GOTV pseudo-player entries never belong on a roster.
fn is_gotv(player: &str) -> bool {
    player.trim().to_uppercase().ends_with("GOTV")
}

/// Most recent team display name per side at or before `target`.
/// Sides with no status line at all fall back to the side designation.
fn team_names_at(events: &[String], target: NaiveDateTime) -> IndexMap<Side, String> {
    let mut mapping: IndexMap<Side, String> = IndexMap::new();

    for line in events.iter().rev() {
        let Some(ts) = tokenizer::line_timestamp(line) else {
            continue;
        };
        if ts > target {
            continue;
        }
        let Some(caps) = team_name_re().captures(line) else {
            continue;
        };
        let Some(side) = Side::parse(&caps["side"]) else {
            continue;
        };
        mapping.entry(side).or_insert(caps["name"].trim().to_string());
        if mapping.len() == 2 {
            break;
        }
    }

    for side in Side::both() {
        mapping.entry(side).or_insert(side.as_str().to_string());
    }
    mapping
}

fn sorted_roster(names: HashSet<String>) -> Vec<String> {
    let mut roster: Vec<String> = names.into_iter().collect();
    roster.sort_by_key(|name| name.to_lowercase());
    roster.truncate(ROSTER_SIZE_PER_SIDE);
    roster
}

/// Roster from item-interaction lines at the exact target second.
///
/// At match start the freeze-time item shuffle packs all ten players into
/// one second, so exact equality is enough.
fn roster_from_exact_ts(events: &[String], target: NaiveDateTime) -> IndexMap<Side, Vec<String>> {
    let mut players: IndexMap<Side, HashSet<String>> = IndexMap::new();
    for side in Side::both() {
        players.insert(side, HashSet::new());
    }

    for line in events {
        if tokenizer::line_timestamp(line) != Some(target) {
            continue;
        }
        let Some(caps) = player_side_re().captures(line) else {
            continue;
        };
        let player = caps["player"].trim().to_string();
        if is_gotv(&player) {
            continue;
        }
        if let Some(side) = Side::parse(&caps["side"]) {
            players.entry(side).or_default().insert(player);
        }
    }

    players
        .into_iter()
        .map(|(side, names)| (side, sorted_roster(names)))
        .collect()
}

/// Roster at match end, scanning backward from `end` until both sides have
/// enough unique players. The final second alone rarely has ten actions.
fn roster_at_end_backward(events: &[String], end: NaiveDateTime) -> IndexMap<Side, Vec<String>> {
    let mut players: IndexMap<Side, HashSet<String>> = IndexMap::new();
    for side in Side::both() {
        players.insert(side, HashSet::new());
    }

    for line in events.iter().rev() {
        let Some(ts) = tokenizer::line_timestamp(line) else {
            continue;
        };
        if ts > end {
            continue;
        }
        let Some(caps) = player_side_re().captures(line) else {
            continue;
        };
        let player = caps["player"].trim().to_string();
        if is_gotv(&player) {
            continue;
        }
        if let Some(side) = Side::parse(&caps["side"]) {
            players.entry(side).or_default().insert(player);
        }

        let full = Side::both()
            .iter()
            .all(|s| players.get(s).map(HashSet::len).unwrap_or(0) >= ROSTER_SIZE_PER_SIDE);
        if full {
            break;
        }
    }

    players
        .into_iter()
        .map(|(side, names)| (side, sorted_roster(names)))
        .collect()
}

/// Key each side's roster by the team display name current at that instant.
fn build_snapshot(
    team_map: &IndexMap<Side, String>,
    roster_by_side: &IndexMap<Side, Vec<String>>,
) -> IndexMap<String, TeamSnapshot> {
    let mut out = IndexMap::new();
    for side in Side::both() {
        let team_name = team_map
            .get(&side)
            .cloned()
            .unwrap_or_else(|| side.as_str().to_string());
        out.insert(
            team_name,
            TeamSnapshot {
                side,
                roster: roster_by_side.get(&side).cloned().unwrap_or_default(),
            },
        );
    }
    out
}

/// Tabs become spaces and space runs collapse, so tab-aligned engine output
/// reads cleanly in the artifact.
fn normalize_whitespace(s: &str) -> String {
    s.replace('\t', " ")
        .split(' ')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Accolade announcement lines, whitespace-normalized, in stream order.
pub fn extract_accolades(events: &[String]) -> Vec<String> {
    events
        .iter()
        .filter(|line| accolade_re().is_match(line))
        .map(|line| normalize_whitespace(line))
        .collect()
}

/// Build the full roster/accolade document from the window-scoped line set.
pub fn build_roster_document(
    events: &[String],
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> RosterDocument {
    let start_teams = team_names_at(events, start);
    let end_teams = team_names_at(events, end);

    let start_roster = roster_from_exact_ts(events, start);
    let end_roster = roster_at_end_backward(events, end);

    let accolades = extract_accolades(events);
    tracing::debug!(accolades = accolades.len(), "Roster snapshots built");

    RosterDocument {
        match_start: build_snapshot(&start_teams, &start_roster),
        match_end: build_snapshot(&end_teams, &end_roster),
        accolade_events: accolades,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(h: u32, m: u32, s: u32) -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2021, 11, 28)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn drop_line(time: &str, player: &str, side: &str) -> String {
        format!(r#"11/28/2021 - {time}: "{player}<5><STEAM_1:0:1><{side}>" dropped "m4a1""#)
    }

    fn sample_events() -> Vec<String> {
        let mut events = vec![
            r#"11/28/2021 - 20:26:00: MatchStatus: Team playing "CT": Natus Vincere"#.to_string(),
            r#"11/28/2021 - 20:26:00: MatchStatus: Team playing "TERRORIST": Team Vitality"#
                .to_string(),
        ];
        for player in ["s1mple", "electronic", "b1t", "Perfecto", "Boombl4"] {
            events.push(drop_line("20:26:21", player, "CT"));
        }
        for player in ["ZywOo", "apEX", "Kyojin", "misutaaa", "shox"] {
            events.push(drop_line("20:26:21", player, "TERRORIST"));
        }
        events.push(drop_line("20:26:21", "FACEIT GOTV", "CT"));
        events
    }

    #[test]
    fn test_start_snapshot_keys_by_team_name() {
        let events = sample_events();
        let doc = build_roster_document(&events, ts(20, 26, 21), ts(21, 11, 27));

        let navi = doc.match_start.get("Natus Vincere").expect("CT team");
        assert_eq!(navi.side, Side::Ct);
        // Sorted case-insensitively, GOTV filtered out.
        assert_eq!(
            navi.roster,
            vec!["b1t", "Boombl4", "electronic", "Perfecto", "s1mple"]
        );

        let vitality = doc.match_start.get("Team Vitality").expect("T team");
        assert_eq!(vitality.side, Side::Terrorist);
        assert_eq!(vitality.roster.len(), 5);
    }

    #[test]
    fn test_exact_ts_ignores_other_seconds() {
        let mut events = sample_events();
        events.push(drop_line("20:26:22", "latecomer", "CT"));
        let roster = roster_from_exact_ts(&events, ts(20, 26, 21));
        assert!(!roster[&Side::Ct].contains(&"latecomer".to_string()));
    }

    #[test]
    fn test_end_roster_scans_backward_across_seconds() {
        let mut events = sample_events();
        // End-of-match actions are spread over several seconds.
        events.push(drop_line("21:11:20", "ZywOo", "TERRORIST"));
        events.push(drop_line("21:11:27", "s1mple", "CT"));

        let roster = roster_at_end_backward(&events, ts(21, 11, 27));
        assert!(roster[&Side::Ct].contains(&"s1mple".to_string()));
        assert!(roster[&Side::Terrorist].contains(&"ZywOo".to_string()));
    }

    #[test]
    fn test_missing_team_names_fall_back_to_side() {
        let events = vec![drop_line("20:26:21", "solo", "CT")];
        let doc = build_roster_document(&events, ts(20, 26, 21), ts(20, 26, 21));
        assert!(doc.match_start.contains_key("CT"));
        assert!(doc.match_start.contains_key("TERRORIST"));
    }

    #[test]
    fn test_team_name_tracks_side_swap() {
        let mut events = sample_events();
        events.push(
            r#"11/28/2021 - 20:50:00: MatchStatus: Team playing "CT": Team Vitality"#.to_string(),
        );
        let at_start = team_names_at(&events, ts(20, 26, 21));
        let at_end = team_names_at(&events, ts(21, 0, 0));
        assert_eq!(at_start[&Side::Ct], "Natus Vincere");
        assert_eq!(at_end[&Side::Ct], "Team Vitality");
    }

    #[test]
    fn test_accolades_are_whitespace_normalized() {
        let events = vec![
            "11/28/2021 - 21:11:30: ACCOLADE,\tFINAL:\t{mvps},\ts1mple<5>,\tvalue:\t7".to_string(),
            "11/28/2021 - 21:11:30: nothing to see".to_string(),
        ];
        let accolades = extract_accolades(&events);
        assert_eq!(accolades.len(), 1);
        assert_eq!(
            accolades[0],
            "11/28/2021 - 21:11:30: ACCOLADE, FINAL: {mvps}, s1mple<5>, value: 7"
        );
    }
}
