//! Byte views of halo buffers.
//!
//! Halo messages are raw little-endian `f64` payloads preceded by nothing: both
//! sides derive the exact length from the shared layout, so any length
//! disagreement is a topology error and is reported, never truncated.

use bytemuck::{Pod, Zeroable};

use crate::grid_error::GridError;

pub fn cast_slice<T: Pod>(v: &[T]) -> &[u8] {
    bytemuck::cast_slice(v)
}

/// Bytes occupied by `n` halo values.
#[inline]
pub fn halo_bytes(n: usize) -> usize {
    n * std::mem::size_of::<f64>()
}

/// Decode a received halo payload of exactly `expected` values.
pub fn decode_halo(raw: &[u8], expected: usize, neighbor: usize) -> Result<Vec<f64>, GridError> {
    let want = halo_bytes(expected);
    if raw.len() != want {
        return Err(GridError::HaloSizeMismatch {
            neighbor,
            expected: want,
            found: raw.len(),
        });
    }
    // `raw` carries no alignment guarantee; copy through a zeroed f64 buffer.
    let mut out = vec![0.0f64; expected];
    bytemuck::cast_slice_mut::<f64, u8>(&mut out).copy_from_slice(raw);
    Ok(out)
}

/// Scalar reduction payload (value plus contributing rank).
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable, Debug, PartialEq)]
pub struct WireScalar {
    pub value: f64,
    pub rank: u64,
}

static_assertions::const_assert_eq!(std::mem::size_of::<WireScalar>(), 16);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halo_payload_roundtrip() {
        let vals = [1.5f64, -2.0, 3.25];
        let raw = cast_slice(&vals).to_vec();
        assert_eq!(decode_halo(&raw, 3, 1).unwrap(), vals.to_vec());
    }

    #[test]
    fn short_payload_is_a_size_mismatch() {
        let raw = vec![0u8; 12];
        assert_eq!(
            decode_halo(&raw, 2, 4),
            Err(GridError::HaloSizeMismatch {
                neighbor: 4,
                expected: 16,
                found: 12
            })
        );
    }
}
