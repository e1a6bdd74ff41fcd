//! Fixed little-endian wire records for the sparsity exchange.
//!
//! All multi-byte integers are stored pre-LE with `.to_le()` and decoded with
//! `from_le`, so ranks of different endianness agree on the bytes.

use crate::sparsity_error::SparsityError;
use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;
use std::mem::{align_of, size_of};

pub fn cast_slice<T: Pod>(v: &[T]) -> &[u8] {
    bytemuck::cast_slice(v)
}

pub fn cast_slice_mut<T: Pod>(v: &mut [T]) -> &mut [u8] {
    bytemuck::cast_slice_mut(v)
}

/// Decode a received byte buffer into records. Received buffers carry no
/// alignment guarantee, so records are read unaligned.
///
/// # Errors
/// Returns a description if `bytes` is not exactly `expected` records long.
pub fn decode_records<T: Pod>(bytes: &[u8], expected: usize) -> Result<Vec<T>, String> {
    expect_exact_len(bytes.len(), expected * size_of::<T>())?;
    Ok(bytes
        .chunks_exact(size_of::<T>())
        .map(bytemuck::pod_read_unaligned::<T>)
        .collect())
}

pub fn expect_exact_len(actual: usize, expected: usize) -> Result<(), String> {
    if actual == expected {
        Ok(())
    } else {
        Err(format!("expected {expected} bytes, got {actual}"))
    }
}

/// Number of records that follow in the payload phase.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireCount {
    pub n_le: u32,
}

impl WireCount {
    /// # Errors
    /// `InvalidArgument` if `n` does not fit the 32-bit count field.
    pub fn new(n: usize) -> Result<Self, SparsityError> {
        let n = u32::try_from(n).map_err(|_| {
            SparsityError::InvalidArgument(format!(
                "{n} records exceed the {} a single message can announce",
                u32::MAX
            ))
        })?;
        Ok(Self { n_le: n.to_le() })
    }
    pub fn get(&self) -> usize {
        u32::from_le(self.n_le) as usize
    }
}

/// One sparsity entry `(row, column)` in global indices.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct WireEntry {
    pub row_le: u64,
    pub col_le: u64,
}

impl WireEntry {
    pub fn new(row: usize, col: usize) -> Self {
        Self {
            row_le: (row as u64).to_le(),
            col_le: (col as u64).to_le(),
        }
    }
    pub fn row(&self) -> usize {
        u64::from_le(self.row_le) as usize
    }
    pub fn col(&self) -> usize {
        u64::from_le(self.col_le) as usize
    }
}

const_assert_eq!(size_of::<WireCount>(), 4);
const_assert_eq!(size_of::<WireEntry>(), 16);
const_assert_eq!(align_of::<WireEntry>(), 8);
