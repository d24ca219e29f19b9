// matchlog - app/pipeline.rs
//
// Stage orchestration: file I/O, artifact loading/writing, and the
// stage-per-subcommand entry points. Core-layer functions do the analysis;
// this layer owns paths, artifact shapes on disk, and fail-fast checks.
//
// Every stage validates its inputs exist before doing any work, so a
// half-written output is never produced.

use crate::core::model::{RoundsDocument, SummaryDocument};
use crate::core::{aggregate, export, roster, segment, tokenizer, window};
use crate::util::constants::{
    EVENTS_ARTIFACT, LINES_ARTIFACT, LOG_TS_FORMAT, ROSTER_ARTIFACT, ROUNDS_ARTIFACT,
    SUMMARY_ARTIFACT, WINDOW_ARTIFACT,
};
use crate::util::error::{ArtifactError, ExportError, MatchLogError, PipelineError, Result};
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Output format of the columnar event snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Csv,
    Json,
}

// ---------------------------------------------------------------------------
// File helpers
// ---------------------------------------------------------------------------

fn require_input(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(PipelineError::MissingInput {
            path: path.to_path_buf(),
        }
        .into());
    }
    Ok(())
}

/// Read the raw log as lines. Decoding is lossy: invalid UTF-8 sequences
/// are replaced, never fatal. Empty lines are skipped.
fn read_log_lines(path: &Path) -> Result<Vec<String>> {
    require_input(path)?;

    let bytes = fs::read(path).map_err(|e| MatchLogError::Io {
        path: path.to_path_buf(),
        operation: "read",
        source: e,
    })?;

    let lines: Vec<String> = String::from_utf8_lossy(&bytes)
        .lines()
        .map(|line| line.trim_end_matches('\r').to_string())
        .filter(|line| !line.is_empty())
        .collect();

    tracing::info!(path = %path.display(), lines = lines.len(), "Log loaded");
    Ok(lines)
}

fn write_json_pretty<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let file = fs::File::create(path).map_err(|e| MatchLogError::Io {
        path: path.to_path_buf(),
        operation: "create",
        source: e,
    })?;
    serde_json::to_writer_pretty(file, value).map_err(|e| {
        MatchLogError::Export(ExportError::Json {
            path: path.to_path_buf(),
            source: e,
        })
    })?;
    tracing::info!(path = %path.display(), "Artifact written");
    Ok(())
}

fn read_json_value(path: &Path) -> Result<serde_json::Value> {
    require_input(path)?;

    let text = fs::read_to_string(path).map_err(|e| MatchLogError::Io {
        path: path.to_path_buf(),
        operation: "read",
        source: e,
    })?;
    serde_json::from_str(&text).map_err(|e| {
        ArtifactError::Json {
            path: path.to_path_buf(),
            source: e,
        }
        .into()
    })
}

/// Load the start/end bracket from a match-window artifact.
fn load_window_bracket(path: &Path) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let doc = read_json_value(path)?;
    Ok((
        window_timestamp(&doc, "start_dt", path)?,
        window_timestamp(&doc, "end_dt", path)?,
    ))
}

fn window_timestamp(doc: &serde_json::Value, key: &str, path: &Path) -> Result<NaiveDateTime> {
    let raw = doc.get(key).and_then(|v| v.as_str()).ok_or_else(|| {
        MatchLogError::from(PipelineError::WindowUnresolved {
            path: path.to_path_buf(),
        })
    })?;

    tokenizer::parse_ts(raw).ok_or_else(|| {
        PipelineError::BadTimestamp {
            path: path.to_path_buf(),
            raw: raw.to_string(),
            format: LOG_TS_FORMAT,
        }
        .into()
    })
}

/// Sanitize a line for JSON artifacts: embedded `"` becomes `'` so the
/// serialized document stays free of escaped quotes.
pub fn sanitize(line: &str) -> String {
    line.replace('"', "'")
}

/// Lines whose timestamp falls inside the window, both ends inclusive.
fn lines_in_window(lines: &[String], start: NaiveDateTime, end: NaiveDateTime) -> Vec<String> {
    lines
        .iter()
        .filter(|line| {
            tokenizer::line_timestamp(line).is_some_and(|ts| start <= ts && ts <= end)
        })
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// `window` stage: resolve the match window and write its descriptor.
pub fn window_stage(log_path: &Path, out_path: &Path) -> Result<()> {
    let lines = read_log_lines(log_path)?;
    let window = window::resolve_window(&lines);
    write_json_pretty(&window, out_path)
}

/// `lines` stage: the sanitized flat line array.
pub fn lines_stage(log_path: &Path, out_path: &Path) -> Result<()> {
    let lines = read_log_lines(log_path)?;
    let sanitized: Vec<String> = lines.iter().map(|line| sanitize(line)).collect();
    write_json_pretty(&sanitized, out_path)
}

/// `rounds` stage: window-scoped, round-grouped sanitized lines.
///
/// Keys are `round_N` by position in stream order, which stays unique even
/// when a restart resets the per-epoch round index.
pub fn rounds_stage(log_path: &Path, window_path: &Path, out_path: &Path) -> Result<()> {
    let lines = read_log_lines(log_path)?;
    let (start, end) = load_window_bracket(window_path)?;

    let windowed = lines_in_window(&lines, start, end);
    tracing::info!(windowed = windowed.len(), "Lines inside match window");

    let events = windowed
        .iter()
        .filter_map(|line| tokenizer::tokenize(line))
        .map(crate::core::extract::classify_and_extract);
    let segmentation = segment::segment(events);

    let mut rounds: IndexMap<String, Vec<String>> = IndexMap::new();
    for (position, round) in segmentation.rounds.iter().enumerate() {
        let key = format!("round_{}", position + 1);
        let body_lines = round
            .events
            .iter()
            .map(|e| sanitize(&format!("{}: {}", e.ts.format(LOG_TS_FORMAT), e.body)))
            .collect();
        rounds.insert(key, body_lines);
    }

    let doc = RoundsDocument {
        round_count: rounds.len(),
        total_event_lines: rounds.values().map(Vec::len).sum(),
        rounds,
    };
    write_json_pretty(&doc, out_path)
}

/// `summarise` stage: per-round statistics plus the match overview,
/// computed from the round-grouped artifact.
pub fn summarise_stage(rounds_path: &Path, out_path: &Path) -> Result<()> {
    let doc = read_json_value(rounds_path)?;

    let rounds_value = doc.get("rounds").ok_or(ArtifactError::MissingKey {
        path: rounds_path.to_path_buf(),
        key: "rounds",
    })?;
    let rounds_obj = rounds_value.as_object().ok_or_else(|| ArtifactError::WrongShape {
        path: rounds_path.to_path_buf(),
        key: "rounds".to_string(),
        expected: "object mapping round keys to line arrays",
    })?;

    let mut summaries = IndexMap::new();
    for (key, value) in rounds_obj {
        let lines: Vec<String> = value
            .as_array()
            .and_then(|arr| {
                arr.iter()
                    .map(|v| v.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
            })
            .ok_or_else(|| ArtifactError::WrongShape {
                path: rounds_path.to_path_buf(),
                key: key.clone(),
                expected: "array of strings",
            })?;
        summaries.insert(key.clone(), aggregate::summarize_lines(&lines));
    }

    let overview = aggregate::match_overview(&summaries);
    let out = SummaryDocument {
        rounds: summaries,
        match_overview: overview,
    };
    write_json_pretty(&out, out_path)
}

/// `roster` stage: team roster snapshots at match start/end plus accolades.
pub fn roster_stage(log_path: &Path, window_path: &Path, out_path: &Path) -> Result<()> {
    let lines = read_log_lines(log_path)?;
    let (start, end) = load_window_bracket(window_path)?;

    let windowed = lines_in_window(&lines, start, end);
    let doc = roster::build_roster_document(&windowed, start, end);
    write_json_pretty(&doc, out_path)
}

/// `events` stage: columnar per-line snapshot over the whole capture.
pub fn events_stage(log_path: &Path, out_path: &Path, format: SnapshotFormat) -> Result<()> {
    let lines = read_log_lines(log_path)?;

    let events = lines
        .iter()
        .filter_map(|line| tokenizer::tokenize(line))
        .map(crate::core::extract::classify_and_extract);
    let segmentation = segment::segment(events);
    let rows = export::event_rows(&segmentation);

    let file = fs::File::create(out_path).map_err(|e| MatchLogError::Io {
        path: out_path.to_path_buf(),
        operation: "create",
        source: e,
    })?;

    let count = match format {
        SnapshotFormat::Csv => export::export_csv(&rows, file, &out_path.to_path_buf())?,
        SnapshotFormat::Json => export::export_json(&rows, file, &out_path.to_path_buf())?,
    };
    tracing::info!(path = %out_path.display(), rows = count, "Event snapshot written");
    Ok(())
}

/// `run` stage: the full chain in dependency order, failing fast on the
/// first fatal error.
pub fn run_all(log_path: &Path, out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir).map_err(|e| MatchLogError::Io {
        path: out_dir.to_path_buf(),
        operation: "create directory",
        source: e,
    })?;

    let window_path = out_dir.join(WINDOW_ARTIFACT);
    let rounds_path = out_dir.join(ROUNDS_ARTIFACT);

    window_stage(log_path, &window_path)?;
    lines_stage(log_path, &out_dir.join(LINES_ARTIFACT))?;
    rounds_stage(log_path, &window_path, &rounds_path)?;
    summarise_stage(&rounds_path, &out_dir.join(SUMMARY_ARTIFACT))?;
    roster_stage(log_path, &window_path, &out_dir.join(ROSTER_ARTIFACT))?;
    events_stage(log_path, &out_dir.join(EVENTS_ARTIFACT), SnapshotFormat::Csv)?;

    tracing::info!(out_dir = %out_dir.display(), "Pipeline complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 11, 28)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_sanitize_replaces_quotes() {
        assert_eq!(
            sanitize(r#""Alice<5>" killed "Bob<7>""#),
            "'Alice<5>' killed 'Bob<7>'"
        );
    }

    #[test]
    fn test_lines_in_window_is_inclusive() {
        let lines: Vec<String> = vec![
            "11/28/2021 - 20:00:00: too early".into(),
            "11/28/2021 - 20:26:21: at start".into(),
            "11/28/2021 - 20:40:00: inside".into(),
            "11/28/2021 - 21:11:27: at end".into(),
            "11/28/2021 - 21:20:00: too late".into(),
            "no timestamp here".into(),
        ];
        let windowed = lines_in_window(&lines, ts(20, 26, 21), ts(21, 11, 27));
        assert_eq!(windowed.len(), 3);
        assert!(windowed[0].contains("at start"));
        assert!(windowed[2].contains("at end"));
    }

    #[test]
    fn test_missing_input_is_reported_before_processing() {
        let err = read_log_lines(Path::new("/nonexistent/match.log")).unwrap_err();
        assert!(matches!(
            err,
            MatchLogError::Pipeline(PipelineError::MissingInput { .. })
        ));
        assert_eq!(err.exit_code(), crate::util::constants::EXIT_FAILURE);
    }

    #[test]
    fn test_window_bracket_requires_both_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("window.json");
        fs::write(&path, r#"{"start_dt": "11/28/2021 - 20:26:21"}"#).unwrap();

        let err = load_window_bracket(&path).unwrap_err();
        assert!(matches!(
            err,
            MatchLogError::Pipeline(PipelineError::WindowUnresolved { .. })
        ));
    }

    #[test]
    fn test_window_bracket_rejects_bad_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("window.json");
        fs::write(
            &path,
            r#"{"start_dt": "not a timestamp", "end_dt": "11/28/2021 - 21:11:27"}"#,
        )
        .unwrap();

        let err = load_window_bracket(&path).unwrap_err();
        assert!(matches!(
            err,
            MatchLogError::Pipeline(PipelineError::BadTimestamp { .. })
        ));
    }

    #[test]
    fn test_invalid_json_artifact_exits_distinctly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rounds.json");
        fs::write(&path, "{ not json").unwrap();

        let err = summarise_stage(&path, &dir.path().join("out.json")).unwrap_err();
        assert!(matches!(err, MatchLogError::Artifact(_)));
        assert_eq!(err.exit_code(), crate::util::constants::EXIT_BAD_ARTIFACT);
    }

    #[test]
    fn test_summarise_rejects_wrong_round_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rounds.json");
        fs::write(
            &path,
            r#"{"round_count": 1, "total_event_lines": 1, "rounds": {"round_1": 42}}"#,
        )
        .unwrap();

        let err = summarise_stage(&path, &dir.path().join("out.json")).unwrap_err();
        assert!(matches!(
            err,
            MatchLogError::Artifact(ArtifactError::WrongShape { .. })
        ));
    }

    #[test]
    fn test_summarise_requires_rounds_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rounds.json");
        fs::write(&path, r#"{"round_count": 0}"#).unwrap();

        let err = summarise_stage(&path, &dir.path().join("out.json")).unwrap_err();
        assert!(matches!(
            err,
            MatchLogError::Artifact(ArtifactError::MissingKey { key: "rounds", .. })
        ));
    }
}
