// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Little-endian TL serialization buffer.

/// TL values are aligned to 4-byte words.
const WORD: usize = 4;

/// Longest payload that fits a one-byte length prefix.
const MAX_SHORT_LENGTH: usize = 253;

/// Marker byte announcing a 3-byte length prefix.
const LONG_LENGTH_MARKER: u8 = 254;

/// Append-only byte buffer with TL primitive writers.
#[derive(Debug, Default)]
pub(crate) struct Buffer {
    buf: Vec<u8>,
}

impl Buffer {
    pub(crate) fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn put_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    /// Writes length-prefixed bytes padded with zeros to a word boundary.
    pub(crate) fn put_bytes(&mut self, v: &[u8]) {
        let len = v.len();
        let written = if len <= MAX_SHORT_LENGTH {
            self.buf.push(len as u8);
            len + 1
        } else {
            self.buf.push(LONG_LENGTH_MARKER);
            self.buf.extend_from_slice(&(len as u32).to_le_bytes()[..3]);
            len + 4
        };
        self.buf.extend_from_slice(v);
        let padding = written.next_multiple_of(WORD) - written;
        self.buf.resize(self.buf.len() + padding, 0);
    }

    pub(crate) fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}
