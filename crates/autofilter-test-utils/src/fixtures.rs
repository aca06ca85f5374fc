// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builders for fetched channel messages.

use autofilter_core::traits::protocol::{
    DocumentAttribute, FetchedMessage, RawDocument, RawMedia, RawMessage,
};

/// Post date shared by every fixture message.
pub const POSTED_AT: i64 = 1_700_000_000;

/// A document message with the given attributes. The document id and size
/// derive from `id`, so distinct ids yield distinct handles.
pub fn with_attributes(id: i64, attributes: Vec<DocumentAttribute>) -> FetchedMessage {
    FetchedMessage::Regular(RawMessage {
        id,
        date: POSTED_AT + id,
        media: Some(RawMedia::Document(Some(RawDocument {
            id: 9_000_000_000 + id,
            access_hash: 7_000_000 + id * 13,
            file_reference: vec![2, 0, 0, (id % 251) as u8, 0, 9],
            dc_id: 4,
            size: 10_000 * id,
            mime_type: "application/octet-stream".into(),
            attributes,
        }))),
    })
}

/// A named generic document.
pub fn document(id: i64, name: &str) -> FetchedMessage {
    with_attributes(id, vec![DocumentAttribute::Filename(name.into())])
}

pub fn video(id: i64, name: &str) -> FetchedMessage {
    with_attributes(
        id,
        vec![
            DocumentAttribute::Video { duration_secs: 120 },
            DocumentAttribute::Filename(name.into()),
        ],
    )
}

/// A document without a filename attribute.
pub fn unnamed_document(id: i64) -> FetchedMessage {
    with_attributes(id, Vec::new())
}

pub fn sticker(id: i64) -> FetchedMessage {
    with_attributes(
        id,
        vec![
            DocumentAttribute::Sticker,
            DocumentAttribute::Filename("sticker.webp".into()),
        ],
    )
}

/// A plain text post.
pub fn no_media(id: i64) -> FetchedMessage {
    FetchedMessage::Regular(RawMessage {
        id,
        date: POSTED_AT + id,
        media: None,
    })
}

pub fn service(id: i64) -> FetchedMessage {
    FetchedMessage::Service { id }
}
