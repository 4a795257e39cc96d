// SPDX-License-Identifier: MIT OR Apache-2.0
//! Padded input buffers
//!
//! Stage 1 reads the input in 64-byte blocks and the scalar parsers read up
//! to 32 bytes past the byte they were handed, so every input must be backed
//! by an allocation with at least [`PADDING`] addressable bytes beyond its
//! logical length. [`PaddedBuffer`] owns such an allocation;
//! [`PaddedSlice`] borrows one the caller prepared.

use crate::error::{ErrorKind, Result};
use std::fs;
use std::path::Path;

/// Required number of addressable bytes past the logical end of the input.
pub const PADDING: usize = 32;

/// Largest supported document length. Structural offsets are 32-bit.
pub const MAX_DOCUMENT_LEN: usize = 0xFFFF_FFFF;

/// An owned input buffer with [`PADDING`] zero-filled trailing bytes.
#[derive(Debug, Clone, Default)]
pub struct PaddedBuffer {
    bytes: Vec<u8>,
    len: usize,
}

impl PaddedBuffer {
    /// Take ownership of `bytes` and re-allocate them with trailing padding.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Capacity`] when the input is longer than
    /// [`MAX_DOCUMENT_LEN`].
    pub fn new(mut bytes: Vec<u8>) -> Result<Self> {
        let len = bytes.len();
        if len > MAX_DOCUMENT_LEN {
            return Err(ErrorKind::Capacity);
        }
        bytes.try_reserve(PADDING).map_err(|_| ErrorKind::MemAlloc)?;
        bytes.resize(len + PADDING, 0);
        Ok(Self { bytes, len })
    }

    /// Copy `bytes` into a fresh padded allocation.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Capacity`] when the input is longer than
    /// [`MAX_DOCUMENT_LEN`].
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Self::new(bytes.to_vec())
    }

    /// Copy a string into a fresh padded allocation.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Capacity`] when the input is longer than
    /// [`MAX_DOCUMENT_LEN`].
    pub fn from_str(text: &str) -> Result<Self> {
        Self::from_slice(text.as_bytes())
    }

    /// Read a whole file into a padded allocation.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::IoError`] when the file cannot be read and
    /// [`ErrorKind::Capacity`] when it is longer than [`MAX_DOCUMENT_LEN`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path).map_err(|_| ErrorKind::IoError)?;
        Self::new(bytes)
    }

    /// Logical length of the document, excluding padding.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the document is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The document bytes without padding.
    #[must_use]
    pub fn document(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Borrow this buffer as a [`PaddedSlice`].
    #[must_use]
    pub fn as_padded(&self) -> PaddedSlice<'_> {
        PaddedSlice {
            bytes: &self.bytes,
            len: self.len,
        }
    }
}

/// A borrowed input region whose backing slice extends at least [`PADDING`]
/// bytes past the logical document length.
#[derive(Debug, Clone, Copy)]
pub struct PaddedSlice<'a> {
    bytes: &'a [u8],
    len: usize,
}

impl<'a> PaddedSlice<'a> {
    /// Wrap a caller-prepared region. `bytes` is the full addressable slice
    /// and `len` the logical document length within it.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InsufficientPadding`] when fewer than
    /// [`PADDING`] bytes follow the document, and [`ErrorKind::Capacity`]
    /// when the document is longer than [`MAX_DOCUMENT_LEN`].
    pub const fn new(bytes: &'a [u8], len: usize) -> Result<Self> {
        if len > MAX_DOCUMENT_LEN {
            return Err(ErrorKind::Capacity);
        }
        if bytes.len() < len || bytes.len() - len < PADDING {
            return Err(ErrorKind::InsufficientPadding);
        }
        Ok(Self { bytes, len })
    }

    /// Logical length of the document, excluding padding.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the document is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The document bytes without padding.
    #[must_use]
    pub fn document(&self) -> &'a [u8] {
        &self.bytes[..self.len]
    }

    /// The full addressable region including padding.
    #[must_use]
    pub const fn padded(&self) -> &'a [u8] {
        self.bytes
    }

    /// Re-window this slice to the document suffix starting at `offset`.
    /// The padding guarantee carries over unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `offset > self.len()`.
    #[must_use]
    pub fn suffix(&self, offset: usize) -> PaddedSlice<'a> {
        assert!(offset <= self.len);
        PaddedSlice {
            bytes: &self.bytes[offset..],
            len: self.len - offset,
        }
    }
}
