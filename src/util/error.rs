// matchlog - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Every fatal error names the file it concerns and what was expected;
// no stage raises an opaque error without context.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all matchlog operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum MatchLogError {
    /// A required upstream artifact was present but malformed.
    Artifact(ArtifactError),

    /// Pipeline orchestration failed (missing inputs, bad arguments).
    Pipeline(PipelineError),

    /// Columnar snapshot export failed.
    Export(ExportError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl MatchLogError {
    /// Process exit code for this error class.
    ///
    /// Malformed artifacts exit with a distinct code so callers can tell
    /// "your upstream JSON is broken" apart from plain I/O failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Artifact(_) => crate::util::constants::EXIT_BAD_ARTIFACT,
            _ => crate::util::constants::EXIT_FAILURE,
        }
    }
}

impl fmt::Display for MatchLogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Artifact(e) => write!(f, "Artifact error: {e}"),
            Self::Pipeline(e) => write!(f, "Pipeline error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for MatchLogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Artifact(e) => Some(e),
            Self::Pipeline(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Artifact errors
// ---------------------------------------------------------------------------

/// Errors reading intermediate JSON artifacts produced by earlier stages.
#[derive(Debug)]
pub enum ArtifactError {
    /// The file is not valid JSON.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A required key is absent from the document.
    MissingKey { path: PathBuf, key: &'static str },

    /// A key exists but holds the wrong shape of value.
    WrongShape {
        path: PathBuf,
        key: String,
        expected: &'static str,
    },
}

impl fmt::Display for ArtifactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json { path, source } => {
                write!(f, "Invalid JSON in '{}': {source}", path.display())
            }
            Self::MissingKey { path, key } => {
                write!(f, "'{}': missing required key '{key}'", path.display())
            }
            Self::WrongShape {
                path,
                key,
                expected,
            } => write!(
                f,
                "'{}': key '{key}' has the wrong shape, expected {expected}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for ArtifactError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ArtifactError> for MatchLogError {
    fn from(e: ArtifactError) -> Self {
        Self::Artifact(e)
    }
}

// ---------------------------------------------------------------------------
// Pipeline errors
// ---------------------------------------------------------------------------

/// Errors related to stage orchestration.
#[derive(Debug)]
pub enum PipelineError {
    /// A required input file does not exist. Checked before any processing
    /// so a half-written output is never produced.
    MissingInput { path: PathBuf },

    /// The match window artifact lacks the timestamps needed to scope
    /// downstream stages.
    WindowUnresolved { path: PathBuf },

    /// A timestamp string inside an artifact did not parse.
    BadTimestamp {
        path: PathBuf,
        raw: String,
        format: &'static str,
    },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingInput { path } => {
                write!(f, "Required input file '{}' does not exist", path.display())
            }
            Self::WindowUnresolved { path } => write!(
                f,
                "Match window '{}' has no start_dt/end_dt; cannot scope the log",
                path.display()
            ),
            Self::BadTimestamp { path, raw, format } => write!(
                f,
                "'{}': cannot parse timestamp '{raw}' with format '{format}'",
                path.display()
            ),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<PipelineError> for MatchLogError {
    fn from(e: PipelineError) -> Self {
        Self::Pipeline(e)
    }
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors related to columnar snapshot export.
#[derive(Debug)]
pub enum ExportError {
    /// I/O error writing the export file.
    Io { path: PathBuf, source: io::Error },

    /// CSV serialisation error.
    Csv { path: PathBuf, source: csv::Error },

    /// JSON serialisation error.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Export I/O error '{}': {source}", path.display())
            }
            Self::Csv { path, source } => {
                write!(f, "CSV export error '{}': {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "JSON export error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

impl From<ExportError> for MatchLogError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

/// Convenience type alias for matchlog results.
pub type Result<T> = std::result::Result<T, MatchLogError>;
