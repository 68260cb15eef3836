//! Binary encode/decode for checkpoint records.
//!
//! All integers are little-endian. Strings are length-prefixed with a
//! `u32` length. 64-bit history counters use the split encoding (two
//! non-negative `i32` halves around 10^9). No compression, no padding.

use std::io::{Read, Write};

use tally_core::HistoryId;
use tally_score::{ScoringArray, ScoringCell};

use crate::error::CheckpointError;
use crate::{FORMAT_VERSION, MAGIC};

/// Divisor of the split counter encoding.
pub const COUNTER_SPLIT: u64 = 1_000_000_000;

// ── Primitive writers ───────────────────────────────────────────

/// Write a single byte.
pub fn write_u8(w: &mut dyn Write, v: u8) -> Result<(), CheckpointError> {
    w.write_all(&[v])?;
    Ok(())
}

/// Write a little-endian u16.
pub fn write_u16_le(w: &mut dyn Write, v: u16) -> Result<(), CheckpointError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian u32.
pub fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), CheckpointError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian u64.
pub fn write_u64_le(w: &mut dyn Write, v: u64) -> Result<(), CheckpointError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian i32.
pub fn write_i32_le(w: &mut dyn Write, v: i32) -> Result<(), CheckpointError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian f64.
pub fn write_f64_le(w: &mut dyn Write, v: f64) -> Result<(), CheckpointError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a length-prefixed UTF-8 string (u32 length + bytes).
pub fn write_length_prefixed_str(w: &mut dyn Write, s: &str) -> Result<(), CheckpointError> {
    write_u32_le(w, s.len() as u32)?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

/// Write a 64-bit counter as `(n / 10^9, n % 10^9)`, two i32s.
///
/// Fails with [`CheckpointError::CounterOverflow`] when the high half
/// does not fit an `i32` (counters of about 2.1e18 and above).
pub fn write_counter(w: &mut dyn Write, v: u64) -> Result<(), CheckpointError> {
    let hi = i32::try_from(v / COUNTER_SPLIT)
        .map_err(|_| CheckpointError::CounterOverflow { value: v })?;
    let lo = (v % COUNTER_SPLIT) as i32;
    write_i32_le(w, hi)?;
    write_i32_le(w, lo)?;
    Ok(())
}

// ── Primitive readers ───────────────────────────────────────────

/// Read a single byte.
pub fn read_u8(r: &mut dyn Read) -> Result<u8, CheckpointError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Read a little-endian u16.
pub fn read_u16_le(r: &mut dyn Read) -> Result<u16, CheckpointError> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

/// Read a little-endian u32.
pub fn read_u32_le(r: &mut dyn Read) -> Result<u32, CheckpointError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Read a little-endian u64.
pub fn read_u64_le(r: &mut dyn Read) -> Result<u64, CheckpointError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Read a little-endian i32.
pub fn read_i32_le(r: &mut dyn Read) -> Result<i32, CheckpointError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

/// Read a little-endian f64.
pub fn read_f64_le(r: &mut dyn Read) -> Result<f64, CheckpointError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

/// Read a length-prefixed UTF-8 string.
pub fn read_length_prefixed_str(r: &mut dyn Read) -> Result<String, CheckpointError> {
    let len = read_u32_le(r)?;
    let mut buf = Vec::new();
    // Grow as bytes arrive so a corrupt length cannot force a huge
    // allocation.
    Read::take(&mut *r, u64::from(len)).read_to_end(&mut buf)?;
    if buf.len() as u64 != u64::from(len) {
        return Err(CheckpointError::MalformedRecord {
            detail: format!("string truncated: expected {len} bytes, got {}", buf.len()),
        });
    }
    String::from_utf8(buf).map_err(|e| CheckpointError::MalformedRecord {
        detail: format!("invalid UTF-8 string: {e}"),
    })
}

/// Read a split 64-bit counter written by [`write_counter`].
pub fn read_counter(r: &mut dyn Read) -> Result<u64, CheckpointError> {
    let hi = read_i32_le(r)?;
    let lo = read_i32_le(r)?;
    if hi < 0 || lo < 0 || lo as u64 >= COUNTER_SPLIT {
        return Err(CheckpointError::MalformedRecord {
            detail: format!("invalid split counter ({hi}, {lo})"),
        });
    }
    Ok(hi as u64 * COUNTER_SPLIT + lo as u64)
}

// ── Stream header ───────────────────────────────────────────────

/// Encode the stream header (magic and version).
pub fn encode_header(w: &mut dyn Write) -> Result<(), CheckpointError> {
    w.write_all(&MAGIC)?;
    write_u8(w, FORMAT_VERSION)?;
    Ok(())
}

/// Decode and validate the stream header.
pub fn decode_header(r: &mut dyn Read) -> Result<(), CheckpointError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(CheckpointError::InvalidMagic);
    }
    let version = read_u8(r)?;
    if version != FORMAT_VERSION {
        return Err(CheckpointError::UnsupportedVersion { found: version });
    }
    Ok(())
}

// ── Scoring records ─────────────────────────────────────────────

/// Encode one cell as `(last_short_id, sum, sum2)`.
///
/// The pending history is written as if complete.
pub fn encode_cell(w: &mut dyn Write, cell: &ScoringCell) -> Result<(), CheckpointError> {
    let (sum, sum2) = cell.completed_totals();
    write_u16_le(w, cell.last_short_id())?;
    write_f64_le(w, sum)?;
    write_f64_le(w, sum2)?;
    Ok(())
}

/// Decode one cell. The restored cell has no pending history.
pub fn decode_cell(r: &mut dyn Read) -> Result<ScoringCell, CheckpointError> {
    let last_short_id = read_u16_le(r)?;
    let sum = read_f64_le(r)?;
    let sum2 = read_f64_le(r)?;
    Ok(ScoringCell::from_totals(last_short_id, sum, sum2))
}

/// Encode a full scoring array record.
pub fn encode_array(w: &mut dyn Write, array: &ScoringArray) -> Result<(), CheckpointError> {
    let slots = u32::try_from(array.bins()).map_err(|_| CheckpointError::MalformedRecord {
        detail: format!("slot count {} exceeds u32::MAX", array.bins()),
    })?;
    write_u32_le(w, slots)?;
    write_u16_le(w, array.short_id())?;
    write_counter(w, array.current_case().0)?;
    write_counter(w, array.epoch())?;
    for cell in array.cells() {
        encode_cell(w, cell)?;
    }
    Ok(())
}

/// Decode a scoring array record into a new array of the recorded shape.
///
/// Rejects a zero slot count, and an epoch or short id that disagrees
/// with the recorded history counter.
pub fn decode_array(r: &mut dyn Read) -> Result<ScoringArray, CheckpointError> {
    let slots = read_u32_le(r)?;
    if slots == 0 {
        return Err(CheckpointError::MalformedRecord {
            detail: "scoring array record with zero slots".into(),
        });
    }
    let short_id = read_u16_le(r)?;
    let case = HistoryId(read_counter(r)?);
    let epoch = read_counter(r)?;
    if epoch != case.epoch() || short_id != case.short_id() {
        return Err(CheckpointError::MalformedRecord {
            detail: format!(
                "history counter {case} inconsistent with epoch {epoch} / short id {short_id}"
            ),
        });
    }
    // Grow as cells arrive: a corrupt count fails at end of stream
    // instead of allocating up front.
    let mut cells = Vec::new();
    for _ in 0..slots {
        cells.push(decode_cell(r)?);
    }
    Ok(ScoringArray::from_parts(case, cells)?)
}
