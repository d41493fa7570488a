//! # Metrics Sink
//!
//! Append-only CSV log of authentication events, consumed by external
//! analysis tooling and never read back by the engine.
//!
//! ```text
//! timestamp,event,username,duration_ms,extra1,extra2,extra3
//! 2025-03-01T12:00:00.000Z,register,alice,41,start=1740830399959,end=1740830400000,stored_hash=1|2
//! 2025-03-01T12:00:05.000Z,login-success,alice,730,fetch=120,proof=600,-
//! ```
//!
//! Each row is encoded in full by a `csv` writer into a buffer, then written
//! with a single `write_all` while holding the sink's mutex, so concurrent
//! appends never interleave.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use zkauth_core::{Commitment, Username};

use crate::error::MetricsError;

/// CSV header columns.
pub const CSV_COLUMNS: [&str; 7] = [
    "timestamp",
    "event",
    "username",
    "duration_ms",
    "extra1",
    "extra2",
    "extra3",
];

/// Encode one record as a complete, newline-terminated CSV line.
fn encode_record<I, T>(record: I) -> Result<Vec<u8>, csv::Error>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::with_capacity(128));
    writer.write_record(record)?;
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// Kind of recorded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A commitment was registered.
    Register,
    /// A login proof verified.
    LoginSuccess,
    /// A login proof was rejected by the verifier.
    LoginInvalid,
}

impl EventKind {
    /// The CSV `event` column value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::LoginSuccess => "login-success",
            Self::LoginInvalid => "login-invalid",
        }
    }
}

/// Client-reported timings sent with a registration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisterTimings {
    /// Client-side duration of the whole registration.
    pub client_duration_ms: Option<f64>,
    /// Client clock at start (epoch ms).
    pub client_start_ms: Option<f64>,
    /// Client clock at end (epoch ms).
    pub client_end_ms: Option<f64>,
}

/// Client-reported timings sent with a login.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginTimings {
    /// Client-side duration of the whole login.
    pub total_duration_ms: Option<f64>,
    /// Time spent fetching artifacts.
    pub fetch_duration_ms: Option<f64>,
    /// Time spent generating the proof.
    pub proof_duration_ms: Option<f64>,
}

/// One metric row.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricEvent {
    /// Server time of the event.
    pub timestamp: DateTime<Utc>,
    /// Event kind.
    pub kind: EventKind,
    /// Subject of the event.
    pub username: Username,
    /// Duration in milliseconds.
    pub duration_ms: f64,
    /// Free-form context columns.
    pub extras: [String; 3],
}

/// Client values win when present and non-zero.
fn client_or(client: Option<f64>, server: f64) -> f64 {
    client.filter(|v| v.is_finite() && *v != 0.0).unwrap_or(server)
}

fn epoch_ms(t: DateTime<Utc>) -> f64 {
    t.timestamp_millis() as f64
}

impl MetricEvent {
    /// Registration row: `start=`, `end=`, `stored_hash=c0|c1`.
    pub fn register(
        username: &Username,
        commitment: &Commitment,
        started: DateTime<Utc>,
        finished: DateTime<Utc>,
        timings: &RegisterTimings,
    ) -> Self {
        let server_ms = (finished - started).num_milliseconds() as f64;
        Self {
            timestamp: finished,
            kind: EventKind::Register,
            username: username.clone(),
            duration_ms: client_or(timings.client_duration_ms, server_ms),
            extras: [
                format!("start={}", client_or(timings.client_start_ms, epoch_ms(started))),
                format!("end={}", client_or(timings.client_end_ms, epoch_ms(finished))),
                format!("stored_hash={commitment}"),
            ],
        }
    }

    /// Login row: `fetch=`, `proof=`, `-`.
    pub fn login(
        username: &Username,
        success: bool,
        started: DateTime<Utc>,
        finished: DateTime<Utc>,
        timings: &LoginTimings,
    ) -> Self {
        let server_ms = (finished - started).num_milliseconds() as f64;
        Self {
            timestamp: finished,
            kind: if success {
                EventKind::LoginSuccess
            } else {
                EventKind::LoginInvalid
            },
            username: username.clone(),
            duration_ms: client_or(timings.total_duration_ms, server_ms),
            extras: [
                format!("fetch={}", client_or(timings.fetch_duration_ms, 0.0)),
                format!("proof={}", client_or(timings.proof_duration_ms, 0.0)),
                "-".to_string(),
            ],
        }
    }

    /// The complete CSV line, newline included.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Encode`] if the record cannot be encoded.
    pub fn to_csv_row(&self) -> Result<Vec<u8>, MetricsError> {
        let timestamp = self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
        let duration = self.duration_ms.to_string();
        let [extra1, extra2, extra3] = &self.extras;
        Ok(encode_record([
            timestamp.as_str(),
            self.kind.as_str(),
            self.username.as_str(),
            duration.as_str(),
            extra1.as_str(),
            extra2.as_str(),
            extra3.as_str(),
        ])?)
    }
}

/// Append-only CSV sink.
#[derive(Debug)]
pub struct MetricsSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl MetricsSink {
    /// Open (creating directories and header as needed) the metrics file.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Io`] if the directory or file cannot be
    /// created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MetricsError> {
        let path = path.as_ref().to_path_buf();
        let io = |source: std::io::Error| MetricsError::Io {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io)?;
        if file.metadata().map_err(io)?.len() == 0 {
            file.write_all(&encode_record(CSV_COLUMNS)?).map_err(io)?;
        }
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Path of the metrics file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event as a single line.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Io`] if the write fails.
    pub fn record(&self, event: &MetricEvent) -> Result<(), MetricsError> {
        let row = event.to_csv_row()?;
        self.file
            .lock()
            .write_all(&row)
            .map_err(|source| MetricsError::Io {
                path: self.path.clone(),
                source,
            })
    }
}
