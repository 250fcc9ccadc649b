//! Forward-only reader over a timeline stream.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use super::TrajectoryError;
use super::format::{RawBody, TrajectoryHeader, cycles_in, decode_bodies};

/// Timeline reader.
///
/// The reader is a forward cursor: snapshots must be requested in cycle
/// order, once each. It is not `Clone`; a stream has exactly one owner.
///
/// Usage:
/// ```ignore
/// let mut reader = TrajectoryReader::open("timeline.dat")?;
/// println!("{} bodies over {} cycles", reader.body_count(), reader.cycle_count());
///
/// for snapshot in reader.snapshots() {
///     let snapshot = snapshot?;
///     // Use snapshot...
/// }
/// ```
pub struct TrajectoryReader<R = BufReader<File>> {
    reader: R,
    header: TrajectoryHeader,
    stream_len: u64,
    cycle_count: u64,
    next_cycle: u64,
    /// Set once a read has failed partway; the cursor is no longer aligned.
    broken: bool,
    /// Snapshot buffer, sized on first read.
    read_buffer: Vec<u8>,
}

impl TrajectoryReader<BufReader<File>> {
    /// Open a timeline file for playback.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TrajectoryError> {
        let path = path.as_ref();
        let open_err = |source: io::Error| TrajectoryError::Open {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(open_err)?;
        let stream_len = file.metadata().map_err(open_err)?.len();

        log::info!("Opening timeline {} ({} bytes)", path.display(), stream_len);
        Self::with_len(BufReader::new(file), stream_len)
    }
}

impl<R: Read + Seek> TrajectoryReader<R> {
    /// Wrap a seekable stream, measuring its length.
    pub fn from_reader(mut reader: R) -> Result<Self, TrajectoryError> {
        let stream_len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;
        Self::with_len(reader, stream_len)
    }
}

impl<R: Read> TrajectoryReader<R> {
    /// Wrap a stream positioned at its first byte whose total length is known.
    pub fn with_len(mut reader: R, stream_len: u64) -> Result<Self, TrajectoryError> {
        let mut buf = [0u8; TrajectoryHeader::SIZE];
        let got = read_full(&mut reader, &mut buf)?;
        if got < TrajectoryHeader::SIZE || stream_len < TrajectoryHeader::SIZE as u64 {
            return Err(TrajectoryError::CorruptHeader {
                reason: format!(
                    "expected {} header bytes, stream holds {}",
                    TrajectoryHeader::SIZE,
                    got.min(stream_len as usize)
                ),
            });
        }

        let header =
            TrajectoryHeader::decode(buf).map_err(|raw| TrajectoryError::CorruptHeader {
                reason: format!("body count must be positive, found {}", raw),
            })?;
        let cycle_count =
            cycles_in(stream_len, &header).ok_or_else(|| TrajectoryError::CorruptHeader {
                reason: "snapshot size is zero".to_string(),
            })?;

        let trailing =
            stream_len - TrajectoryHeader::SIZE as u64 - cycle_count * header.snapshot_size();
        if trailing > 0 {
            log::warn!(
                "Ignoring {} trailing bytes after the last whole cycle",
                trailing
            );
        }
        log::info!(
            "Timeline has {} bodies over {} cycles",
            header.body_count,
            cycle_count
        );

        Ok(Self {
            reader,
            header,
            stream_len,
            cycle_count,
            next_cycle: 0,
            broken: false,
            read_buffer: Vec::new(),
        })
    }

    /// Get timeline header.
    pub fn header(&self) -> &TrajectoryHeader {
        &self.header
    }

    /// Number of bodies in every snapshot.
    pub fn body_count(&self) -> usize {
        self.header.body_count as usize
    }

    /// Number of whole cycles in the stream.
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Total stream length in bytes, header included.
    pub fn stream_len(&self) -> u64 {
        self.stream_len
    }

    /// Index of the next snapshot the cursor will return.
    pub fn next_cycle(&self) -> u64 {
        self.next_cycle
    }

    /// Byte offset of the next snapshot.
    pub fn offset(&self) -> u64 {
        TrajectoryHeader::SIZE as u64 + self.next_cycle * self.header.snapshot_size()
    }

    /// Read the snapshot for cycle `index`.
    ///
    /// `index` must equal [`next_cycle`](Self::next_cycle).
    pub fn read_snapshot(&mut self, index: u64) -> Result<Snapshot, TrajectoryError> {
        let mut bodies = Vec::new();
        self.read_snapshot_into(index, &mut bodies)?;
        Ok(Snapshot {
            cycle: index,
            bodies,
        })
    }

    /// Read the snapshot for cycle `index` into a caller-owned buffer.
    pub fn read_snapshot_into(
        &mut self,
        index: u64,
        bodies: &mut Vec<RawBody>,
    ) -> Result<(), TrajectoryError> {
        if index != self.next_cycle {
            return Err(TrajectoryError::OutOfSequence {
                expected: self.next_cycle,
                requested: index,
            });
        }

        let offset = self.offset();
        let needed = self.header.snapshot_size();
        if self.broken || index >= self.cycle_count {
            // Nothing is read, so the cursor stays where it is.
            return Err(TrajectoryError::UnexpectedEof {
                cycle: index,
                offset,
                needed,
                available: if self.broken {
                    0
                } else {
                    self.stream_len.saturating_sub(offset).min(needed)
                },
            });
        }

        if self.read_buffer.len() != needed as usize {
            self.read_buffer.resize(needed as usize, 0);
        }
        let available = match read_full(&mut self.reader, &mut self.read_buffer) {
            Ok(n) => n as u64,
            Err(e) => {
                self.broken = true;
                return Err(e.into());
            }
        };
        if available < needed {
            self.broken = true;
            return Err(TrajectoryError::UnexpectedEof {
                cycle: index,
                offset,
                needed,
                available,
            });
        }

        decode_bodies(&self.read_buffer, bodies);
        self.next_cycle += 1;
        Ok(())
    }

    /// Iterate over the remaining snapshots.
    pub fn snapshots(&mut self) -> SnapshotIterator<'_, R> {
        SnapshotIterator {
            reader: self,
            done: false,
        }
    }
}

/// Read until `buf` is full or the stream ends. Returns the bytes read.
fn read_full<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// One decoded cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Cycle index, starting at 0.
    pub cycle: u64,
    /// Body records in identity order.
    pub bodies: Vec<RawBody>,
}

impl Snapshot {
    /// Bodies present this cycle, with their identity index.
    pub fn present(&self) -> impl Iterator<Item = (usize, &RawBody)> {
        self.bodies.iter().enumerate().filter(|(_, b)| b.is_present())
    }
}

/// Summary of one snapshot, for progress displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SnapshotStats {
    /// Bodies with non-negative mass.
    pub present: usize,
    /// Bodies flagged absent.
    pub absent: usize,
    /// Sum of present masses.
    pub total_mass: i64,
    /// Largest present mass, if any body is present.
    pub heaviest: Option<i32>,
}

impl SnapshotStats {
    pub fn from_bodies(bodies: &[RawBody]) -> Self {
        let mut stats = Self::default();
        for body in bodies {
            if body.is_present() {
                stats.present += 1;
                stats.total_mass += body.mass as i64;
                stats.heaviest = Some(stats.heaviest.map_or(body.mass, |m| m.max(body.mass)));
            } else {
                stats.absent += 1;
            }
        }
        stats
    }
}

/// Iterator over the remaining snapshots of a reader.
///
/// Yields at most one error, then stops.
pub struct SnapshotIterator<'a, R> {
    reader: &'a mut TrajectoryReader<R>,
    done: bool,
}

impl<'a, R: Read> Iterator for SnapshotIterator<'a, R> {
    type Item = Result<Snapshot, TrajectoryError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.reader.next_cycle >= self.reader.cycle_count {
            return None;
        }

        let cycle = self.reader.next_cycle;
        let result = self.reader.read_snapshot(cycle);
        self.done = result.is_err();
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        let remaining = self.reader.cycle_count.saturating_sub(self.reader.next_cycle) as usize;
        (0, Some(remaining))
    }
}
