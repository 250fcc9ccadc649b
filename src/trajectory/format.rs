//! Binary format definitions for trajectory timeline files.

use std::io::{self, Read, Write};

/// Header for a trajectory timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrajectoryHeader {
    /// Number of body records in every snapshot.
    pub body_count: u32,
}

impl TrajectoryHeader {
    /// Size of header in bytes.
    pub const SIZE: usize = 4;

    /// Size of one snapshot in bytes.
    pub fn snapshot_size(&self) -> u64 {
        self.body_count as u64 * RawBody::SIZE as u64
    }

    /// Write header to output.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&(self.body_count as i32).to_le_bytes())
    }

    /// Decode the raw header bytes.
    ///
    /// The count is stored as a signed integer; anything non-positive is
    /// rejected and reported back as the raw value.
    pub fn decode(bytes: [u8; Self::SIZE]) -> Result<Self, i32> {
        let raw = i32::from_le_bytes(bytes);
        if raw <= 0 {
            return Err(raw);
        }
        Ok(Self {
            body_count: raw as u32,
        })
    }
}

/// One body's state in one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawBody {
    /// World-space X coordinate.
    pub x: i32,
    /// World-space Y coordinate.
    pub y: i32,
    /// Mass; negative means the body is absent this cycle.
    pub mass: i32,
}

impl RawBody {
    /// Size of one body record in bytes: x(4) + y(4) + mass(4).
    pub const SIZE: usize = 12;

    /// Record written for bodies that were merged, ejected or destroyed.
    pub const ABSENT: RawBody = RawBody {
        x: -1,
        y: -1,
        mass: -1,
    };

    pub fn new(x: i32, y: i32, mass: i32) -> Self {
        Self { x, y, mass }
    }

    /// Whether the body takes part in this cycle.
    #[inline]
    pub fn is_present(&self) -> bool {
        self.mass >= 0
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.x.to_le_bytes())?;
        w.write_all(&self.y.to_le_bytes())?;
        w.write_all(&self.mass.to_le_bytes())?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; Self::SIZE];
        r.read_exact(&mut buf)?;
        Ok(Self::decode(&buf))
    }

    /// Decode one record from exactly [`RawBody::SIZE`] bytes.
    #[inline]
    pub fn decode(b: &[u8; Self::SIZE]) -> Self {
        Self {
            x: i32::from_le_bytes([b[0], b[1], b[2], b[3]]),
            y: i32::from_le_bytes([b[4], b[5], b[6], b[7]]),
            mass: i32::from_le_bytes([b[8], b[9], b[10], b[11]]),
        }
    }
}

/// Decode a full snapshot buffer into body records.
///
/// `bytes` must hold a whole number of records; trailing bytes are ignored.
pub fn decode_bodies(bytes: &[u8], output: &mut Vec<RawBody>) {
    output.clear();
    output.extend(bytes.chunks_exact(RawBody::SIZE).map(|chunk| {
        let mut record = [0u8; RawBody::SIZE];
        record.copy_from_slice(chunk);
        RawBody::decode(&record)
    }));
}

/// Number of whole cycles contained in a stream of `stream_len` bytes.
///
/// Partial trailing cycles are dropped by the truncating division.
pub fn cycles_in(stream_len: u64, header: &TrajectoryHeader) -> Option<u64> {
    let snapshot_size = header.snapshot_size();
    if snapshot_size == 0 {
        return None;
    }
    Some(stream_len.saturating_sub(TrajectoryHeader::SIZE as u64) / snapshot_size)
}

/// Encode a whole timeline into a byte buffer.
pub fn encode_timeline(body_count: u32, cycles: &[Vec<RawBody>]) -> io::Result<Vec<u8>> {
    let header = TrajectoryHeader { body_count };
    let mut buf = Vec::with_capacity(
        TrajectoryHeader::SIZE + cycles.len() * header.snapshot_size() as usize,
    );
    header.write_to(&mut buf)?;
    for snapshot in cycles {
        for body in snapshot {
            body.write_to(&mut buf)?;
        }
    }
    Ok(buf)
}
