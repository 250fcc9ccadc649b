//! Trajectory timeline decoding.
//!
//! A timeline is the output of an offline N-body run: the body count,
//! followed by one snapshot per simulated cycle.
//!
//! # File Format
//!
//! ```text
//! Header (4 bytes):
//!   Body count: i32 (must be > 0)
//!
//! Snapshots (cycles * body_count * 12 bytes):
//!   Per body, in identity order:
//!     x: i32
//!     y: i32
//!     mass: i32 (negative = body absent this cycle)
//! ```
//!
//! All integers are little-endian. There is no footer and no cycle count;
//! the number of cycles is derived from the stream length, and a trailing
//! partial cycle is ignored.

use std::io;
use std::path::PathBuf;

mod format;
mod reader;

pub use format::{RawBody, TrajectoryHeader, cycles_in, decode_bodies, encode_timeline};
pub use reader::{Snapshot, SnapshotIterator, SnapshotStats, TrajectoryReader};

/// Errors raised while opening or reading a timeline.
#[derive(Debug, thiserror::Error)]
pub enum TrajectoryError {
    #[error("Failed to open timeline {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("I/O failure: {0}")]
    Io(#[from] io::Error),
    #[error("Corrupt header: {reason}")]
    CorruptHeader { reason: String },
    #[error(
        "Unexpected end of stream in cycle {cycle} at byte offset {offset}: \
         needed {needed} bytes, {available} available"
    )]
    UnexpectedEof {
        cycle: u64,
        offset: u64,
        needed: u64,
        available: u64,
    },
    #[error("Snapshot {requested} requested but the cursor is at cycle {expected}")]
    OutOfSequence { expected: u64, requested: u64 },
}
