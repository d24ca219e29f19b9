// matchlog - core/export.rs
//
// Columnar snapshot of the segmented event stream, for the dashboard and
// API collaborators. Writes to any Write trait object.
//
// One row per in-round event, carrying its 1-based round index, plus the
// restart boundary markers attributed to no round. Rows are merged back
// into timestamp order.

use crate::core::model::{ClassifiedEvent, EventRow};
use crate::core::segment::Segmentation;
use crate::util::constants::LOG_TS_FORMAT;
use crate::util::error::ExportError;
use std::io::Write;
use std::path::PathBuf;

fn row(event: &ClassifiedEvent, round: Option<u32>) -> EventRow {
    EventRow {
        dt: event.ts.format(LOG_TS_FORMAT).to_string(),
        event: event.label.as_label(),
        round,
        attacker_name: event.attacker.as_ref().map(|p| p.name.clone()),
        attacker_userid: event.attacker.as_ref().map(|p| p.user_id),
        attacker_steam: event.attacker.as_ref().map(|p| p.persistent_id.clone()),
        attacker_team: event.attacker.as_ref().and_then(|p| p.team.clone()),
        victim_name: event.victim.as_ref().map(|p| p.name.clone()),
        victim_userid: event.victim.as_ref().map(|p| p.user_id),
        victim_steam: event.victim.as_ref().map(|p| p.persistent_id.clone()),
        victim_team: event.victim.as_ref().and_then(|p| p.team.clone()),
        weapon: event.weapon.clone(),
        is_headshot: event.headshot,
        msg: event.body.clone(),
    }
}

/// Flatten a segmentation into columnar rows in timestamp order.
pub fn event_rows(segmentation: &Segmentation) -> Vec<EventRow> {
    let mut rows: Vec<(chrono::NaiveDateTime, EventRow)> = Vec::new();

    for round in &segmentation.rounds {
        for event in &round.events {
            rows.push((event.ts, row(event, Some(round.index))));
        }
    }
    for restart in &segmentation.restarts {
        rows.push((restart.ts, row(restart, None)));
    }

    // Stable sort: equal-second rows keep their stream order.
    rows.sort_by_key(|(ts, _)| *ts);
    rows.into_iter().map(|(_, r)| r).collect()
}

/// Export rows to CSV.
///
/// Writes: dt, event, round, attacker_*, victim_*, weapon, is_headshot, msg
pub fn export_csv<W: Write>(
    rows: &[EventRow],
    writer: W,
    export_path: &PathBuf,
) -> Result<usize, ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer
        .write_record([
            "dt",
            "event",
            "round",
            "attacker_name",
            "attacker_userid",
            "attacker_steam",
            "attacker_team",
            "victim_name",
            "victim_userid",
            "victim_steam",
            "victim_team",
            "weapon",
            "is_headshot",
            "msg",
        ])
        .map_err(|e| ExportError::Csv {
            path: export_path.clone(),
            source: e,
        })?;

    let opt = |s: &Option<String>| s.clone().unwrap_or_default();
    let mut count = 0;
    for r in rows {
        csv_writer
            .write_record([
                r.dt.clone(),
                r.event.clone(),
                r.round.map(|n| n.to_string()).unwrap_or_default(),
                opt(&r.attacker_name),
                r.attacker_userid.map(|n| n.to_string()).unwrap_or_default(),
                opt(&r.attacker_steam),
                opt(&r.attacker_team),
                opt(&r.victim_name),
                r.victim_userid.map(|n| n.to_string()).unwrap_or_default(),
                opt(&r.victim_steam),
                opt(&r.victim_team),
                opt(&r.weapon),
                r.is_headshot.map(|b| b.to_string()).unwrap_or_default(),
                r.msg.clone(),
            ])
            .map_err(|e| ExportError::Csv {
                path: export_path.clone(),
                source: e,
            })?;
        count += 1;
    }

    csv_writer.flush().map_err(|e| ExportError::Io {
        path: export_path.clone(),
        source: e,
    })?;

    Ok(count)
}

/// Export rows to JSON (array of objects).
pub fn export_json<W: Write>(
    rows: &[EventRow],
    writer: W,
    export_path: &PathBuf,
) -> Result<usize, ExportError> {
    serde_json::to_writer_pretty(writer, rows).map_err(|e| ExportError::Json {
        path: export_path.clone(),
        source: e,
    })?;
    Ok(rows.len())
}
