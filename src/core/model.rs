// matchlog - core/model.rs
//
// Core data model types. Pure data definitions with no I/O.
// These types are the shared vocabulary across all pipeline stages; every
// stage produces new records rather than mutating its inputs.

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};

// =============================================================================
// Log line (output of the tokenizer)
// =============================================================================

/// One raw log line split into its timestamp prefix and message body.
///
/// Timestamps are log-local wall clock at second resolution; no timezone
/// conversion is performed anywhere in the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    pub ts: NaiveDateTime,
    pub body: String,
}

// =============================================================================
// Event label
// =============================================================================

/// Stable semantic label for a message body.
///
/// The vocabulary is open (the engine can emit arbitrary trigger names and
/// verb phrases) but the statistically common labels get closed variants so
/// downstream matches stay exhaustive. `Trigger` and `Verb` carry the slug
/// for the long tail; `Other` is the catch-all — classification never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventLabel {
    /// `World triggered "X"` / `"player" triggered "X"` — slug of X.
    Trigger(String),
    Killed,
    Assisted,
    Attacked,
    Purchased,
    Threw,
    Dropped,
    PickedUp,
    Connect,
    EnterGame,
    Disconnect,
    TeamSwitch,
    Chat,
    /// Long-tail verb phrase, already slugged.
    Verb(String),
    Other,
}

impl EventLabel {
    /// The wire form of the label, e.g. `trigger_round_start` or `killed`.
    pub fn as_label(&self) -> String {
        match self {
            Self::Trigger(slug) => format!("trigger_{slug}"),
            Self::Killed => "killed".to_string(),
            Self::Assisted => "assisted".to_string(),
            Self::Attacked => "attacked".to_string(),
            Self::Purchased => "purchased".to_string(),
            Self::Threw => "threw".to_string(),
            Self::Dropped => "dropped".to_string(),
            Self::PickedUp => "picked_up".to_string(),
            Self::Connect => "connect".to_string(),
            Self::EnterGame => "enter_game".to_string(),
            Self::Disconnect => "disconnect".to_string(),
            Self::TeamSwitch => "team_switch".to_string(),
            Self::Chat => "chat".to_string(),
            Self::Verb(slug) => slug.clone(),
            Self::Other => "other".to_string(),
        }
    }

    /// Returns the trigger slug when this label is a trigger event.
    pub fn trigger_slug(&self) -> Option<&str> {
        match self {
            Self::Trigger(slug) => Some(slug.as_str()),
            _ => None,
        }
    }

    /// True when the trigger slug is one of the given names.
    pub fn is_trigger_in(&self, slugs: &[&str]) -> bool {
        self.trigger_slug().is_some_and(|s| slugs.contains(&s))
    }
}

impl std::fmt::Display for EventLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_label())
    }
}

impl Serialize for EventLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_label())
    }
}

// =============================================================================
// Player identity
// =============================================================================

/// A player identity tuple extracted from the bracketed token format
/// `name<user_id><STEAM_...><TEAM>` embedded in message bodies.
///
/// Identities are not globally deduplicated; equality is by persistent id
/// when both sides have one, else by name.
#[derive(Debug, Clone, Eq, Serialize)]
pub struct PlayerIdentity {
    pub name: String,
    pub user_id: u32,
    /// Persistent id with the recognisable `STEAM_` prefix.
    pub persistent_id: String,
    /// Side tag at the time of the event; empty tags become `None`.
    pub team: Option<String>,
}

impl PartialEq for PlayerIdentity {
    fn eq(&self, other: &Self) -> bool {
        if !self.persistent_id.is_empty() && !other.persistent_id.is_empty() {
            self.persistent_id == other.persistent_id
        } else {
            self.name == other.name
        }
    }
}

// =============================================================================
// Classified event
// =============================================================================

/// A tokenized log line annotated with its label and any extracted fields.
///
/// Extraction is best-effort: a malformed kill line keeps partially-null
/// fields rather than failing the whole line.
#[derive(Debug, Clone)]
pub struct ClassifiedEvent {
    pub ts: NaiveDateTime,
    pub label: EventLabel,
    pub body: String,
    pub attacker: Option<PlayerIdentity>,
    pub victim: Option<PlayerIdentity>,
    pub weapon: Option<String>,
    pub headshot: Option<bool>,
}

// =============================================================================
// Kill event
// =============================================================================

/// A fully-resolved player-versus-player kill.
///
/// Only produced when both player tokens parse; `killed other`
/// (environmental death) lines never yield one.
#[derive(Debug, Clone, PartialEq)]
pub struct KillEvent {
    pub ts: NaiveDateTime,
    pub attacker: PlayerIdentity,
    pub victim: PlayerIdentity,
    /// Lower-cased weapon name from the `with "<weapon>"` clause.
    pub weapon: String,
    pub headshot: bool,
}

/// Serialized form of a kill inside a round summary document.
#[derive(Debug, Clone, Serialize)]
pub struct KillRecord {
    /// Time of day (`HH:MM:SS`), when the source line carried a timestamp.
    pub time: Option<String>,
    pub killed_by: String,
    pub killed: String,
    pub weapon: String,
    pub is_headshot: bool,
}

// =============================================================================
// Side
// =============================================================================

/// One of the two fixed round-structure designations, independent of the
/// team display name (which can be reassigned between halves).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Ct,
    Terrorist,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ct => "CT",
            Self::Terrorist => "TERRORIST",
        }
    }

    /// Parse the log's side tag (case-insensitive).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "CT" => Some(Self::Ct),
            "TERRORIST" => Some(Self::Terrorist),
            _ => None,
        }
    }

    pub fn both() -> [Side; 2] {
        [Side::Ct, Side::Terrorist]
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Side {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// =============================================================================
// Round window (output of the segmenter)
// =============================================================================

/// The ordered slice of classified events belonging to one round, bounded
/// by its start and end markers (both inclusive).
#[derive(Debug, Clone)]
pub struct RoundWindow {
    /// 1-based, dense after normalization; resets after a restart marker.
    pub index: u32,
    /// False when the round never saw its end marker (truncated capture or
    /// a new start arriving while the previous round was still open).
    pub complete: bool,
    pub events: Vec<ClassifiedEvent>,
}

impl RoundWindow {
    /// Earliest timestamp observed anywhere in the window.
    ///
    /// Timestamp extremes are taken over all lines rather than the marker
    /// lines alone, tolerating slightly out-of-order lines and markers that
    /// lack timestamps.
    pub fn start_time(&self) -> Option<NaiveDateTime> {
        self.events.iter().map(|e| e.ts).min()
    }

    /// Latest timestamp observed anywhere in the window.
    pub fn end_time(&self) -> Option<NaiveDateTime> {
        self.events.iter().map(|e| e.ts).max()
    }
}

// =============================================================================
// Round summary
// =============================================================================

/// Per-round statistics, computed once per window and immutable thereafter.
#[derive(Debug, Clone, Serialize)]
pub struct RoundSummary {
    pub round_start: Option<String>,
    pub round_end: Option<String>,
    pub round_length_seconds: Option<i64>,
    pub round_length_minutes_seconds: Option<String>,
    pub winning_side: Option<Side>,
    pub winning_team: Option<String>,
    pub total_kills: usize,
    pub mvp_kills_player: Option<String>,
    pub mvp_kills: u32,
    pub complete: bool,
    pub kill_events: Vec<KillRecord>,
}

// =============================================================================
// Match overview
// =============================================================================

/// A round-length extreme (shortest or longest round of the match).
#[derive(Debug, Clone, Serialize)]
pub struct RoundExtreme {
    pub round: String,
    pub length: String,
    pub length_seconds: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct KillLeader {
    pub player: String,
    pub kills: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeathLeader {
    pub player: String,
    pub deaths: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeaponLeader {
    pub weapon: String,
    pub kills: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeadshotLeader {
    pub player: String,
    pub headshots: u32,
}

/// Match-level roll-ups across all round summaries. Recomputed whole from
/// the full round set; never partially updated.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchOverview {
    pub average_round_length: Option<String>,
    pub shortest_round: Option<RoundExtreme>,
    pub longest_round: Option<RoundExtreme>,
    pub mvp_kills: Option<KillLeader>,
    pub lsp_deaths: Option<DeathLeader>,
    pub top_weapon: Option<WeaponLeader>,
    pub most_headshots: Option<HeadshotLeader>,
}

// =============================================================================
// Match window (output of the overlay-dialect resolver)
// =============================================================================

/// The inclusive timestamp bracket around genuine competitive play, plus
/// the match facts correlated from overlay-tagged lines.
///
/// All timestamp fields use the log's own `MM/DD/YYYY - HH:MM:SS` form so
/// the artifact round-trips without timezone interpretation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchWindow {
    pub date: Option<String>,
    pub start_dt: Option<String>,
    pub end_dt: Option<String>,
    /// Pretty `HH:MM:SS` duration between start_dt and end_dt.
    pub match_length: Option<String>,
    pub map: Option<String>,
    pub team_1: Option<String>,
    pub team_2: Option<String>,
    pub winning_team: Option<String>,
    pub final_score: Option<String>,
    /// Rounds played as reported by the last status line seen.
    pub total_rounds: Option<u32>,
}

// =============================================================================
// Columnar event row (collaborator snapshot)
// =============================================================================

/// One flattened per-line record for the dashboard/API collaborators.
#[derive(Debug, Clone, Serialize)]
pub struct EventRow {
    pub dt: String,
    pub event: String,
    pub round: Option<u32>,
    pub attacker_name: Option<String>,
    pub attacker_userid: Option<u32>,
    pub attacker_steam: Option<String>,
    pub attacker_team: Option<String>,
    pub victim_name: Option<String>,
    pub victim_userid: Option<u32>,
    pub victim_steam: Option<String>,
    pub victim_team: Option<String>,
    pub weapon: Option<String>,
    pub is_headshot: Option<bool>,
    pub msg: String,
}

// =============================================================================
// Artifact documents
// =============================================================================

/// Round-grouped sanitized line artifact (`rounds` stage output).
#[derive(Debug, Clone, Serialize)]
pub struct RoundsDocument {
    pub round_count: usize,
    pub total_event_lines: usize,
    pub rounds: IndexMap<String, Vec<String>>,
}

/// Round summary + overview artifact (`summarise` stage output).
/// Upstream round-count metadata is intentionally dropped here.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryDocument {
    pub rounds: IndexMap<String, RoundSummary>,
    pub match_overview: MatchOverview,
}

/// One team's entry in a roster snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct TeamSnapshot {
    pub side: Side,
    pub roster: Vec<String>,
}

/// Roster / accolade artifact (`roster` stage output). Keyed by resolved
/// team display name.
#[derive(Debug, Clone, Serialize)]
pub struct RosterDocument {
    pub match_start: IndexMap<String, TeamSnapshot>,
    pub match_end: IndexMap<String, TeamSnapshot>,
    pub accolade_events: Vec<String>,
}
