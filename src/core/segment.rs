// matchlog - core/segment.rs
//
// Partitions the classified line stream into round-scoped windows.
//
// Explicit state machine folded over the event sequence: two flags
// (in_round, round_index) threaded through each step, no shared mutable
// state. Every step consumes one event and may emit one closed window.
//
// Rules:
//   - round-start while a round is open: the previous round never saw its
//     end marker; close it flagged incomplete before opening the new one.
//   - restart marker: engine-level round reset. Flips in_round off, resets
//     the index to 0 so the next start becomes round 1 again. The marker is
//     kept in the boundary set but attributed to no round.
//   - round-end: recorded as the closing boundary (inclusive), then the
//     window closes.
//   - dead time (not in a round, not a boundary marker): dropped. Warm-up
//     chatter and intermission lines are excluded from all statistics.
//   - end of input with an open round: retained, flagged incomplete.

use crate::core::model::{ClassifiedEvent, RoundWindow};
use crate::util::constants::{ROUND_END_TRIGGERS, ROUND_RESTART_TRIGGERS, ROUND_START_TRIGGERS};

/// Result of segmenting one classified stream.
#[derive(Debug, Default)]
pub struct Segmentation {
    /// Round windows in stream order. Indices are 1-based and dense within
    /// each restart epoch after `normalize_round_indices`.
    pub rounds: Vec<RoundWindow>,
    /// Restart boundary markers, kept but attributed to no round.
    pub restarts: Vec<ClassifiedEvent>,
}

/// Segmenter flags, threaded through the fold.
#[derive(Debug)]
struct SegmenterState {
    in_round: bool,
    round_index: u32,
    current: Vec<ClassifiedEvent>,
}

impl SegmenterState {
    fn new() -> Self {
        Self {
            in_round: false,
            round_index: 0,
            current: Vec::new(),
        }
    }

    fn close_current(&mut self, complete: bool, out: &mut Vec<RoundWindow>) {
        let events = std::mem::take(&mut self.current);
        out.push(RoundWindow {
            index: self.round_index,
            complete,
            events,
        });
        self.in_round = false;
    }
}

/// Segment a classified event stream into round windows.
pub fn segment<I>(events: I) -> Segmentation
where
    I: IntoIterator<Item = ClassifiedEvent>,
{
    let mut state = SegmenterState::new();
    let mut result = Segmentation::default();

    for event in events {
        if event.label.is_trigger_in(ROUND_RESTART_TRIGGERS) {
            if state.in_round {
                tracing::debug!(
                    round = state.round_index,
                    "Restart marker inside an open round; closing it incomplete"
                );
                state.close_current(false, &mut result.rounds);
            }
            state.round_index = 0;
            result.restarts.push(event);
            continue;
        }

        if event.label.is_trigger_in(ROUND_START_TRIGGERS) {
            if state.in_round {
                tracing::debug!(
                    round = state.round_index,
                    "Round start without a preceding end; closing previous round incomplete"
                );
                state.close_current(false, &mut result.rounds);
            }
            state.in_round = true;
            state.round_index += 1;
            state.current.push(event);
            continue;
        }

        if event.label.is_trigger_in(ROUND_END_TRIGGERS) {
            if state.in_round {
                state.current.push(event);
                state.close_current(true, &mut result.rounds);
            } else {
                tracing::debug!("Stray round-end marker outside any round; dropped");
            }
            continue;
        }

        if state.in_round {
            state.current.push(event);
        }
        // Dead time between rounds: dropped.
    }

    if state.in_round {
        tracing::debug!(
            round = state.round_index,
            "Input ended with an open round; retaining it incomplete"
        );
        state.close_current(false, &mut result.rounds);
    }

    normalize_round_indices(&mut result.rounds);
    result
}

/// Shift round indices so the first detected round becomes round 1.
///
/// Handles captures where the engine's internal counter did not start at 1
/// (truncated recording). Indices inside later restart epochs already
/// restart at 1 and are left untouched by the shift when the minimum is 1.
pub fn normalize_round_indices(rounds: &mut [RoundWindow]) {
    let first = rounds.iter().map(|r| r.index).filter(|&i| i > 0).min();
    if let Some(first) = first {
        if first > 1 {
            for round in rounds.iter_mut() {
                round.index -= first - 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::extract::classify_and_extract;
    use crate::core::model::LogLine;
    use chrono::NaiveDate;

    fn ev(second: u32, body: &str) -> ClassifiedEvent {
        let ts = NaiveDate::from_ymd_opt(2021, 11, 28)
            .unwrap()
            .and_hms_opt(20, 5, second)
            .unwrap();
        classify_and_extract(LogLine {
            ts,
            body: body.to_string(),
        })
    }

    const START: &str = r#"World triggered "Round_Start""#;
    const END: &str = r#"World triggered "Round_End""#;
    const RESTART: &str = r#"World triggered "Restart_Round_(1_second)""#;
    const KILL: &str =
        r#""Alice<5><STEAM_X><CT>" killed "Bob<7><STEAM_Y><TERRORIST>" with "ak47""#;

    #[test]
    fn test_single_complete_round() {
        let seg = segment(vec![
            ev(0, "warmup chatter"),
            ev(1, START),
            ev(2, KILL),
            ev(3, END),
            ev(4, "intermission chatter"),
        ]);

        assert_eq!(seg.rounds.len(), 1);
        let round = &seg.rounds[0];
        assert_eq!(round.index, 1);
        assert!(round.complete);
        // Inclusive of both boundary markers, exclusive of dead time.
        assert_eq!(round.events.len(), 3);
    }

    #[test]
    fn test_dead_time_lines_are_dropped() {
        let seg = segment(vec![ev(0, "chatter"), ev(1, "more chatter")]);
        assert!(seg.rounds.is_empty());
        assert!(seg.restarts.is_empty());
    }

    #[test]
    fn test_dense_indices_across_rounds() {
        let seg = segment(vec![
            ev(1, START),
            ev(2, END),
            ev(3, START),
            ev(4, END),
            ev(5, START),
            ev(6, END),
        ]);
        let indices: Vec<u32> = seg.rounds.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert!(seg.rounds.iter().all(|r| r.complete));
    }

    #[test]
    fn test_restart_resets_round_counter() {
        let seg = segment(vec![
            ev(1, START),
            ev(2, END),
            ev(3, START),
            ev(4, END),
            ev(5, RESTART),
            ev(6, START),
            ev(7, END),
        ]);

        let indices: Vec<u32> = seg.rounds.iter().map(|r| r.index).collect();
        // Post-restart round 1 is distinct from pre-restart round 1.
        assert_eq!(indices, vec![1, 2, 1]);
        assert_eq!(seg.restarts.len(), 1);
        // The restart marker is attributed to no round.
        for round in &seg.rounds {
            assert!(round
                .events
                .iter()
                .all(|e| !e.label.is_trigger_in(ROUND_RESTART_TRIGGERS)));
        }
    }

    #[test]
    fn test_missing_end_marker_flags_incomplete() {
        let seg = segment(vec![ev(1, START), ev(2, KILL), ev(3, START), ev(4, END)]);

        assert_eq!(seg.rounds.len(), 2);
        assert!(!seg.rounds[0].complete);
        assert_eq!(seg.rounds[0].index, 1);
        assert!(seg.rounds[1].complete);
        assert_eq!(seg.rounds[1].index, 2);
    }

    #[test]
    fn test_open_round_at_eof_is_retained() {
        let seg = segment(vec![ev(1, START), ev(2, KILL)]);
        assert_eq!(seg.rounds.len(), 1);
        assert!(!seg.rounds[0].complete);
        assert_eq!(seg.rounds[0].events.len(), 2);
    }

    #[test]
    fn test_stray_end_marker_is_dropped() {
        let seg = segment(vec![ev(1, END), ev(2, START), ev(3, END)]);
        assert_eq!(seg.rounds.len(), 1);
        assert_eq!(seg.rounds[0].index, 1);
    }

    #[test]
    fn test_synonymous_end_triggers_close_rounds() {
        let seg = segment(vec![
            ev(1, START),
            ev(2, r#"World triggered "Round_Officially_End""#),
        ]);
        assert_eq!(seg.rounds.len(), 1);
        assert!(seg.rounds[0].complete);
    }

    #[test]
    fn test_normalize_shifts_truncated_captures() {
        let mut rounds = vec![
            RoundWindow {
                index: 4,
                complete: true,
                events: vec![],
            },
            RoundWindow {
                index: 5,
                complete: true,
                events: vec![],
            },
        ];
        normalize_round_indices(&mut rounds);
        assert_eq!(rounds[0].index, 1);
        assert_eq!(rounds[1].index, 2);
    }
}
