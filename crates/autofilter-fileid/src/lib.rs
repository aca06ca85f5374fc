// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bot API file identifier encoder.
//!
//! Turns a raw remote-media descriptor (datacenter, document id, access hash,
//! file reference) into the opaque `file_id` string the Bot API accepts when
//! re-sending media. The layout is the persistent file id format, version 4,
//! sub-version 34:
//!
//! 1. `u32` type id with the web-location and file-reference flag bits
//! 2. `u32` datacenter id
//! 3. TL bytes: file reference (when present)
//! 4. TL string: URL (web locations only; the id fields are omitted)
//! 5. `i64` id, `i64` access hash, sub-version byte
//! 6. format version byte
//!
//! The result is zero-run compressed and base64 encoded (URL-safe, no padding).
//! Nothing in the workspace decodes these strings, so only the encoder exists.

mod buffer;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use strum::Display;

use crate::buffer::Buffer;

const WEB_LOCATION_FLAG: u32 = 1 << 24;
const FILE_REFERENCE_FLAG: u32 = 1 << 25;
const LATEST_SUB_VERSION: u8 = 34;
const PERSISTENT_ID_VERSION: u8 = 4;

/// Longest zero run folded into a single `(0, n)` pair.
const MAX_ZERO_RUN: u8 = 250;

/// File type ids as understood by the Bot API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[repr(u32)]
pub enum FileIdType {
    Thumbnail = 0,
    ProfilePhoto = 1,
    Photo = 2,
    Voice = 3,
    Video = 4,
    Document = 5,
    Encrypted = 6,
    Temp = 7,
    Sticker = 8,
    Audio = 9,
    Animation = 10,
    EncryptedThumbnail = 11,
    Wallpaper = 12,
    VideoNote = 13,
    SecureRaw = 14,
    Secure = 15,
    Background = 16,
    DocumentAsFile = 17,
}

/// A remote media descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileId {
    pub file_type: FileIdType,
    pub dc_id: i32,
    pub id: i64,
    pub access_hash: i64,
    pub file_reference: Vec<u8>,
    /// Set for web-location files; `id` and `access_hash` are then not encoded.
    pub url: Option<String>,
}

impl FileId {
    /// Descriptor of a regular document stored on a datacenter.
    pub fn document(
        file_type: FileIdType,
        dc_id: i32,
        id: i64,
        access_hash: i64,
        file_reference: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_type,
            dc_id,
            id,
            access_hash,
            file_reference: file_reference.into(),
            url: None,
        }
    }

    /// Encodes the descriptor into a Bot API `file_id`.
    pub fn encode(&self) -> String {
        let mut buf = Buffer::default();
        self.write_latest(&mut buf);
        buf.put_u8(PERSISTENT_ID_VERSION);
        URL_SAFE_NO_PAD.encode(compress_zero_runs(&buf.into_inner()))
    }

    fn write_latest(&self, buf: &mut Buffer) {
        let has_reference = !self.file_reference.is_empty();
        let web_url = self.url.as_deref().filter(|u| !u.is_empty());

        let mut type_id = self.file_type as u32;
        if web_url.is_some() {
            type_id |= WEB_LOCATION_FLAG;
        }
        if has_reference {
            type_id |= FILE_REFERENCE_FLAG;
        }
        buf.put_u32(type_id);
        buf.put_u32(self.dc_id as u32);

        if has_reference {
            buf.put_bytes(&self.file_reference);
        }
        if let Some(url) = web_url {
            buf.put_bytes(url.as_bytes());
            return;
        }
        buf.put_i64(self.id);
        buf.put_i64(self.access_hash);
        buf.put_u8(LATEST_SUB_VERSION);
    }
}

/// Convenience wrapper for [`FileId::encode`].
pub fn encode(file_id: &FileId) -> String {
    file_id.encode()
}

/// Replaces each run of zero bytes with a `(0, run_length)` pair.
fn compress_zero_runs(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut run: u8 = 0;
    for &byte in data {
        if byte == 0 {
            run += 1;
            if run == MAX_ZERO_RUN {
                out.extend_from_slice(&[0, run]);
                run = 0;
            }
            continue;
        }
        if run > 0 {
            out.extend_from_slice(&[0, run]);
            run = 0;
        }
        out.push(byte);
    }
    if run > 0 {
        out.extend_from_slice(&[0, run]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_runs_become_pairs() {
        assert_eq!(compress_zero_runs(&[5, 0, 0, 0, 2]), vec![5, 0, 3, 2]);
        assert_eq!(compress_zero_runs(&[0, 1, 0]), vec![0, 1, 1, 0, 1]);
        assert_eq!(compress_zero_runs(&[7, 8]), vec![7, 8]);
    }

    #[test]
    fn long_zero_runs_are_split() {
        let out = compress_zero_runs(&[0; 300]);
        assert_eq!(out, vec![0, 250, 0, 50]);
    }

    #[test]
    fn document_without_reference_matches_known_id() {
        let id = FileId::document(FileIdType::Document, 2, 1, 2, Vec::new());
        assert_eq!(id.encode(), "BQADAgADAQAHAgAHIgQ");
    }

    #[test]
    fn zero_fields_merge_into_one_run() {
        let id = FileId::document(FileIdType::Audio, 1, 0, 0, Vec::new());
        assert_eq!(encode(&id), "CQADAQATIgQ");
    }

    #[test]
    fn reference_sets_flag_and_is_embedded() {
        let id = FileId::document(
            FileIdType::Video,
            4,
            5678901234567890123,
            -1234567890123456789,
            vec![1, 2, 3, 0, 0, 4],
        );
        assert_eq!(id.encode(), "BAACAgQAAwYBAgMAAgQAActE8rCVgs9O634Wggvv3e4iBA");
    }

    #[test]
    fn web_location_omits_id_fields() {
        let id = FileId {
            url: Some("https://example.com/a.pdf".into()),
            ..FileId::document(FileIdType::Document, 2, 99, 99, Vec::new())
        };
        assert_eq!(id.encode(), "BQACAQIAAxlodHRwczovL2V4YW1wbGUuY29tL2EucGRmAAIE");
    }
}
