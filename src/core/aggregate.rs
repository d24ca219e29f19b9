// matchlog - core/aggregate.rs
//
// Round summaries and match-level roll-ups.
//
// Tie-break contracts (reproducibility, not style):
//   - Round MVP: first player to reach the eventual maximum, tracked by a
//     streaming `>` comparison in kill order. A post-hoc stable sort would
//     disagree when several players finish tied.
//   - Match leaders: linear max-scan over an insertion-ordered tally, so a
//     tied leader that was tallied first keeps the title.

use crate::core::extract;
use crate::core::model::{
    ClassifiedEvent, DeathLeader, HeadshotLeader, KillEvent, KillLeader, KillRecord,
    MatchOverview, RoundExtreme, RoundSummary, RoundWindow, Side, WeaponLeader,
};
use crate::core::tokenizer;
use crate::util::constants::{LOG_TIME_FORMAT, ROUND_END_TRIGGERS};
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use regex::Regex;
use std::sync::OnceLock;

/// `Team 'CT' scored '10'` — per-round score announcement, either quote
/// style.
fn team_scored_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)Team\s+["'](?P<side>CT|TERRORIST)["']\s+scored\s+["'](?P<score>\d+)["']"#)
            .expect("aggregate: invalid score regex")
    })
}

/// `MatchStatus: Team playing 'CT': NaVi` — side-to-display-name mapping.
fn team_playing_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)MatchStatus:\s*Team\s+playing\s+["'](?P<side>CT|TERRORIST)["']\s*:\s*(?P<team>.+?)\s*$"#)
            .expect("aggregate: invalid team-playing regex")
    })
}

fn time_only(ts: NaiveDateTime) -> String {
    ts.format(LOG_TIME_FORMAT).to_string()
}

/// `MM:SS` rendering of a non-negative second count.
pub fn mmss(seconds: i64) -> String {
    let s = seconds.max(0);
    format!("{:02}:{:02}", s / 60, s % 60)
}

impl KillRecord {
    fn from_kill(kill: &KillEvent) -> Self {
        Self {
            time: Some(time_only(kill.ts)),
            killed_by: kill.attacker.name.clone(),
            killed: kill.victim.name.clone(),
            weapon: kill.weapon.clone(),
            is_headshot: kill.headshot,
        }
    }
}

/// Round MVP: attacker with the highest kill count, ties broken by
/// first-to-reach-the-maximum in event order.
pub fn compute_round_mvp(kills: &[KillRecord]) -> (Option<String>, u32) {
    let mut counts: IndexMap<String, u32> = IndexMap::new();
    let mut best_player: Option<String> = None;
    let mut best_kills: u32 = 0;

    for kill in kills {
        let count = counts.entry(kill.killed_by.clone()).or_insert(0);
        *count += 1;
        if *count > best_kills {
            best_kills = *count;
            best_player = Some(kill.killed_by.clone());
        }
    }

    (best_player, best_kills)
}

/// Final per-side scores announced inside a window; the last announcement
/// per side wins.
fn extract_scores(events: &[ClassifiedEvent]) -> IndexMap<Side, u32> {
    let mut scores = IndexMap::new();
    for event in events {
        if let Some(caps) = team_scored_re().captures(&event.body) {
            if let (Some(side), Ok(score)) =
                (Side::parse(&caps["side"]), caps["score"].parse::<u32>())
            {
                scores.insert(side, score);
            }
        }
    }
    scores
}

/// Side-to-display-name mapping from status lines inside a window; the most
/// recent line per side wins (sides swap between halves).
fn extract_team_map(events: &[ClassifiedEvent]) -> IndexMap<Side, String> {
    let mut teams = IndexMap::new();
    for event in events {
        if let Some(caps) = team_playing_re().captures(&event.body) {
            if let Some(side) = Side::parse(&caps["side"]) {
                teams.insert(side, caps["team"].trim().to_string());
            }
        }
    }
    teams
}

/// Round winner from score-delta announcements. A tie or a missing side
/// yields null, never an arbitrary pick.
fn extract_winner(events: &[ClassifiedEvent]) -> (Option<Side>, Option<String>) {
    let scores = extract_scores(events);
    let teams = extract_team_map(events);

    let (ct, t) = match (
        scores.get(&Side::Ct).copied(),
        scores.get(&Side::Terrorist).copied(),
    ) {
        (Some(ct), Some(t)) if ct != t => (ct, t),
        _ => return (None, None),
    };

    let side = if ct > t { Side::Ct } else { Side::Terrorist };
    (Some(side), teams.get(&side).cloned())
}

/// Compute one round's summary from its classified window.
pub fn summarize_events(events: &[ClassifiedEvent], complete: bool) -> RoundSummary {
    // Timestamp extremes over every line in the window, not just the
    // boundary markers: tolerates slightly out-of-order lines.
    let start = events.iter().map(|e| e.ts).min();
    let end = events.iter().map(|e| e.ts).max();
    let length_seconds = match (start, end) {
        (Some(start), Some(end)) => Some((end - start).num_seconds()),
        _ => None,
    };

    let kill_events: Vec<KillRecord> = events
        .iter()
        .filter_map(extract::kill_event)
        .map(|k| KillRecord::from_kill(&k))
        .collect();

    let (mvp_kills_player, mvp_kills) = compute_round_mvp(&kill_events);
    let (winning_side, winning_team) = extract_winner(events);

    RoundSummary {
        round_start: start.map(time_only),
        round_end: end.map(time_only),
        round_length_seconds: length_seconds,
        round_length_minutes_seconds: length_seconds.map(mmss),
        winning_side,
        winning_team,
        total_kills: kill_events.len(),
        mvp_kills_player,
        mvp_kills,
        complete,
        kill_events,
    }
}

/// Summarise a segmented round window.
pub fn summarize_window(window: &RoundWindow) -> RoundSummary {
    summarize_events(&window.events, window.complete)
}

/// Summarise one round of the sanitized round-grouped artifact.
///
/// Lines keep their timestamp prefix; untimestamped lines are skipped the
/// same way the tokenizer skips them in the raw stream. Completeness is
/// recovered from the presence of an end marker.
pub fn summarize_lines(lines: &[String]) -> RoundSummary {
    let events: Vec<ClassifiedEvent> = lines
        .iter()
        .filter_map(|line| tokenizer::tokenize(line))
        .map(extract::classify_and_extract_sanitized)
        .collect();

    let complete = events
        .iter()
        .any(|e| e.label.is_trigger_in(ROUND_END_TRIGGERS));

    summarize_events(&events, complete)
}

/// Linear max-scan over an insertion-ordered tally: on a tie the earlier
/// insertion keeps the lead.
fn leader(tally: &IndexMap<String, u32>) -> Option<(String, u32)> {
    let mut best: Option<(&String, u32)> = None;
    for (key, &count) in tally {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((key, count)),
        }
    }
    best.map(|(k, c)| (k.clone(), c))
}

/// Match-level roll-ups across all round summaries, recomputed whole.
pub fn match_overview(rounds: &IndexMap<String, RoundSummary>) -> MatchOverview {
    let mut overview = MatchOverview::default();

    // Round-length statistics over rounds with a known length; extremes
    // keep the first occurrence on ties (strict comparisons).
    let lengths: Vec<(&String, i64)> = rounds
        .iter()
        .filter_map(|(key, rs)| rs.round_length_seconds.map(|s| (key, s)))
        .collect();

    if !lengths.is_empty() {
        let total: i64 = lengths.iter().map(|(_, s)| s).sum();
        let avg = (total as f64 / lengths.len() as f64).round() as i64;
        overview.average_round_length = Some(mmss(avg));

        let mut shortest = lengths[0];
        let mut longest = lengths[0];
        for &(key, secs) in &lengths[1..] {
            if secs < shortest.1 {
                shortest = (key, secs);
            }
            if secs > longest.1 {
                longest = (key, secs);
            }
        }
        overview.shortest_round = Some(RoundExtreme {
            round: shortest.0.clone(),
            length: mmss(shortest.1),
            length_seconds: shortest.1,
        });
        overview.longest_round = Some(RoundExtreme {
            round: longest.0.clone(),
            length: mmss(longest.1),
            length_seconds: longest.1,
        });
    }

    let mut kills_by_player: IndexMap<String, u32> = IndexMap::new();
    let mut deaths_by_player: IndexMap<String, u32> = IndexMap::new();
    let mut kills_by_weapon: IndexMap<String, u32> = IndexMap::new();
    let mut headshots_by_player: IndexMap<String, u32> = IndexMap::new();

    for summary in rounds.values() {
        for kill in &summary.kill_events {
            *kills_by_player.entry(kill.killed_by.clone()).or_insert(0) += 1;
            *deaths_by_player.entry(kill.killed.clone()).or_insert(0) += 1;
            *kills_by_weapon.entry(kill.weapon.clone()).or_insert(0) += 1;
            if kill.is_headshot {
                *headshots_by_player
                    .entry(kill.killed_by.clone())
                    .or_insert(0) += 1;
            }
        }
    }

    overview.mvp_kills = leader(&kills_by_player).map(|(player, kills)| KillLeader { player, kills });
    overview.lsp_deaths =
        leader(&deaths_by_player).map(|(player, deaths)| DeathLeader { player, deaths });
    overview.top_weapon =
        leader(&kills_by_weapon).map(|(weapon, kills)| WeaponLeader { weapon, kills });
    overview.most_headshots = leader(&headshots_by_player)
        .map(|(player, headshots)| HeadshotLeader { player, headshots });

    overview
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::EventLabel;
    use chrono::NaiveDate;

    fn ev(second: u32, body: &str) -> ClassifiedEvent {
        let ts = NaiveDate::from_ymd_opt(2021, 11, 28)
            .unwrap()
            .and_hms_opt(20, 5, 0)
            .unwrap()
            + chrono::Duration::seconds(second as i64);
        extract::classify_and_extract(crate::core::model::LogLine {
            ts,
            body: body.to_string(),
        })
    }

    fn kill_body(attacker: &str, victim: &str, weapon: &str, headshot: bool) -> String {
        format!(
            r#""{attacker}<1><STEAM_{attacker}><CT>" killed "{victim}<2><STEAM_{victim}><TERRORIST>" with "{weapon}"{}"#,
            if headshot { " (headshot)" } else { "" }
        )
    }

    #[test]
    fn test_round_length_from_timestamp_extremes() {
        let events = vec![
            ev(10, r#"World triggered "Round_Start""#),
            ev(95, "some chatter"),
            ev(40, "out of order line"),
            ev(95, r#"World triggered "Round_End""#),
        ];
        let summary = summarize_events(&events, true);
        assert_eq!(summary.round_start.as_deref(), Some("20:05:10"));
        assert_eq!(summary.round_end.as_deref(), Some("20:06:35"));
        assert_eq!(summary.round_length_seconds, Some(85));
        assert_eq!(summary.round_length_minutes_seconds.as_deref(), Some("01:25"));
    }

    #[test]
    fn test_empty_round_has_null_length() {
        let summary = summarize_events(&[], false);
        assert_eq!(summary.round_length_seconds, None);
        assert_eq!(summary.round_length_minutes_seconds, None);
        assert_eq!(summary.total_kills, 0);
        assert_eq!(summary.mvp_kills_player, None);
        assert_eq!(summary.mvp_kills, 0);
    }

    #[test]
    fn test_three_kill_round_counts_and_mvp() {
        let events = vec![
            ev(10, r#"World triggered "Round_Start""#),
            ev(20, &kill_body("Alice", "Bob", "ak47", true)),
            ev(25, &kill_body("Alice", "Carol", "ak47", false)),
            ev(30, &kill_body("Dave", "Erin", "awp", false)),
            ev(40, r#"World triggered "Round_End""#),
        ];
        let summary = summarize_events(&events, true);
        assert_eq!(summary.total_kills, 3);
        assert_eq!(summary.mvp_kills_player.as_deref(), Some("Alice"));
        assert_eq!(summary.mvp_kills, 2);
        assert!(summary.mvp_kills as usize <= summary.total_kills);
    }

    #[test]
    fn test_mvp_tie_break_is_first_to_reach_max() {
        // Alice kills first, but Bob reaches 2 kills before Alice does.
        // Streaming max-tracking must crown Bob, not the alphabetically or
        // insertion-wise first player.
        let kills: Vec<KillRecord> = [
            ("Alice", "X"),
            ("Bob", "Y"),
            ("Bob", "Z"),
            ("Alice", "W"),
        ]
        .iter()
        .map(|(a, v)| KillRecord {
            time: None,
            killed_by: a.to_string(),
            killed: v.to_string(),
            weapon: "ak47".to_string(),
            is_headshot: false,
        })
        .collect();

        let (mvp, count) = compute_round_mvp(&kills);
        assert_eq!(mvp.as_deref(), Some("Bob"));
        assert_eq!(count, 2);
    }

    #[test]
    fn test_mvp_is_idempotent_over_kill_list() {
        let events = vec![
            ev(10, &kill_body("Alice", "Bob", "ak47", false)),
            ev(11, &kill_body("Bob", "Alice", "awp", false)),
            ev(12, &kill_body("Alice", "Carol", "ak47", false)),
        ];
        let summary = summarize_events(&events, true);
        // Re-aggregating the already-aggregated kill list changes nothing.
        let (mvp, count) = compute_round_mvp(&summary.kill_events);
        assert_eq!(mvp, summary.mvp_kills_player);
        assert_eq!(count, summary.mvp_kills);
        assert_eq!(summary.kill_events.len(), summary.total_kills);
    }

    #[test]
    fn test_winner_from_score_announcements() {
        let events = vec![
            ev(10, r#"Team "CT" scored "10" with 5 players"#),
            ev(11, r#"Team "TERRORIST" scored "8" with 5 players"#),
            ev(12, r#"MatchStatus: Team playing "CT": NaVi"#),
            ev(13, r#"MatchStatus: Team playing "TERRORIST": Vitality"#),
        ];
        let summary = summarize_events(&events, true);
        assert_eq!(summary.winning_side, Some(Side::Ct));
        assert_eq!(summary.winning_team.as_deref(), Some("NaVi"));
    }

    #[test]
    fn test_tied_score_yields_null_winner() {
        let events = vec![
            ev(10, r#"Team "CT" scored "8" with 5 players"#),
            ev(11, r#"Team "TERRORIST" scored "8" with 5 players"#),
        ];
        let summary = summarize_events(&events, true);
        assert_eq!(summary.winning_side, None);
        assert_eq!(summary.winning_team, None);
    }

    #[test]
    fn test_missing_score_yields_null_winner() {
        let events = vec![ev(10, r#"Team "CT" scored "8" with 5 players"#)];
        let summary = summarize_events(&events, true);
        assert_eq!(summary.winning_side, None);
    }

    #[test]
    fn test_summarize_sanitized_lines() {
        let lines: Vec<String> = vec![
            "11/28/2021 - 20:05:10: World triggered 'Round_Start'".into(),
            "11/28/2021 - 20:05:20: 'Alice<5><STEAM_X><CT>' killed 'Bob<7><STEAM_Y><TERRORIST>' with 'ak47' (headshot)".into(),
            "no timestamp on this diagnostic line".into(),
            "11/28/2021 - 20:06:00: World triggered 'Round_End'".into(),
        ];
        let summary = summarize_lines(&lines);
        assert!(summary.complete);
        assert_eq!(summary.total_kills, 1);
        assert_eq!(summary.kill_events[0].killed_by, "Alice");
        assert!(summary.kill_events[0].is_headshot);
        assert_eq!(summary.round_length_seconds, Some(50));
    }

    #[test]
    fn test_overview_extremes_and_average() {
        let mut rounds: IndexMap<String, RoundSummary> = IndexMap::new();
        for (key, secs) in [("round_1", 30), ("round_2", 90), ("round_3", 30)] {
            let events = vec![ev(0, r#"World triggered "Round_Start""#), {
                let mut e = ev(0, r#"World triggered "Round_End""#);
                e.ts += chrono::Duration::seconds(secs);
                e
            }];
            rounds.insert(key.to_string(), summarize_events(&events, true));
        }

        let overview = match_overview(&rounds);
        assert_eq!(overview.average_round_length.as_deref(), Some("00:50"));
        // Tie on 30s between round_1 and round_3: first occurrence wins.
        let shortest = overview.shortest_round.unwrap();
        assert_eq!(shortest.round, "round_1");
        assert_eq!(shortest.length_seconds, 30);
        let longest = overview.longest_round.unwrap();
        assert_eq!(longest.round, "round_2");
    }

    #[test]
    fn test_overview_leaders_with_insertion_order_tie_break() {
        let mut rounds: IndexMap<String, RoundSummary> = IndexMap::new();
        rounds.insert(
            "round_1".to_string(),
            summarize_events(
                &[
                    ev(10, &kill_body("Alice", "Bob", "ak47", true)),
                    ev(11, &kill_body("Bob", "Alice", "awp", true)),
                ],
                true,
            ),
        );

        let overview = match_overview(&rounds);
        // Alice and Bob tie at 1 kill each; Alice was tallied first.
        assert_eq!(overview.mvp_kills.unwrap().player, "Alice");
        assert_eq!(overview.lsp_deaths.unwrap().player, "Bob");
        // ak47 and awp tie at 1 kill; ak47 was inserted first.
        assert_eq!(overview.top_weapon.unwrap().weapon, "ak47");
        assert_eq!(overview.most_headshots.unwrap().player, "Alice");
    }

    #[test]
    fn test_overview_empty_rounds() {
        let rounds: IndexMap<String, RoundSummary> = IndexMap::new();
        let overview = match_overview(&rounds);
        assert!(overview.average_round_length.is_none());
        assert!(overview.mvp_kills.is_none());
        assert!(overview.top_weapon.is_none());
    }

    #[test]
    fn test_classified_score_lines_are_not_triggers() {
        // Score announcements include the word 'scored', not 'triggered';
        // they classify as verbless bodies and must not close rounds.
        assert_eq!(
            ev(0, r#"Team "CT" scored "10" with 5 players"#).label,
            EventLabel::Verb("scored".into())
        );
    }
}
