// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns fetched channel messages into file records.

use thiserror::Error;

use autofilter_core::traits::protocol::{DocumentAttribute, FetchedMessage, RawMedia};
use autofilter_core::{File, FileType};
use autofilter_fileid::{FileId, FileIdType};

use crate::{random_id, FILE_KEY_LEN};

/// Why a message produced no file. Every rejection counts as failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("service message")]
    Service,
    #[error("empty or deleted message")]
    Empty,
    #[error("message has no media")]
    NoMedia,
    #[error("unsupported media: {0}")]
    UnsupportedMedia(String),
    #[error("document is empty")]
    EmptyDocument,
    #[error("sticker, animation or image document")]
    UnsupportedDocument,
    #[error("document has no filename")]
    MissingFilename,
}

/// Id of a fetched entry, whatever its kind.
pub fn message_id(msg: &FetchedMessage) -> i64 {
    match msg {
        FetchedMessage::Regular(m) => m.id,
        FetchedMessage::Service { id } | FetchedMessage::Empty { id } => *id,
    }
}

/// Builds the file record for `msg`, with a fresh unique id and an encoded
/// handle.
pub fn classify(msg: &FetchedMessage) -> Result<File, Rejection> {
    let msg = match msg {
        FetchedMessage::Regular(m) => m,
        FetchedMessage::Service { .. } => return Err(Rejection::Service),
        FetchedMessage::Empty { .. } => return Err(Rejection::Empty),
    };

    let doc = match &msg.media {
        None => return Err(Rejection::NoMedia),
        Some(RawMedia::Document(Some(doc))) => doc,
        Some(RawMedia::Document(None)) => return Err(Rejection::EmptyDocument),
        Some(RawMedia::Photo) => return Err(Rejection::UnsupportedMedia("photo".into())),
        Some(RawMedia::Other(kind)) => return Err(Rejection::UnsupportedMedia(kind.clone())),
    };

    let mut file_type = FileType::Document;
    let mut file_name: Option<&str> = None;
    let mut unsupported = false;
    for attr in &doc.attributes {
        match attr {
            DocumentAttribute::Animated
            | DocumentAttribute::HasStickers
            | DocumentAttribute::ImageSize { .. }
            | DocumentAttribute::Sticker => unsupported = true,
            DocumentAttribute::Audio { voice: true } => file_type = FileType::Voice,
            DocumentAttribute::Audio { voice: false } => file_type = FileType::Audio,
            DocumentAttribute::Video { .. } => file_type = FileType::Video,
            DocumentAttribute::Filename(name) => file_name = Some(name),
            DocumentAttribute::Other(_) => {}
        }
    }
    if unsupported {
        return Err(Rejection::UnsupportedDocument);
    }
    let name = match file_name {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return Err(Rejection::MissingFilename),
    };

    let handle = FileId::document(
        file_id_type(file_type),
        doc.dc_id,
        doc.id,
        doc.access_hash,
        doc.file_reference.clone(),
    )
    .encode();

    Ok(File {
        unique_id: random_id(FILE_KEY_LEN),
        file_handle: handle,
        name,
        file_type,
        size: doc.size,
        saved_at: msg.date,
    })
}

fn file_id_type(file_type: FileType) -> FileIdType {
    match file_type {
        FileType::Document => FileIdType::Document,
        FileType::Video => FileIdType::Video,
        FileType::Audio => FileIdType::Audio,
        FileType::Voice => FileIdType::Voice,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autofilter_core::traits::protocol::{RawDocument, RawMessage};

    fn document(attributes: Vec<DocumentAttribute>) -> FetchedMessage {
        FetchedMessage::Regular(RawMessage {
            id: 7,
            date: 1_700_000_123,
            media: Some(RawMedia::Document(Some(RawDocument {
                id: 5678901234567890123,
                access_hash: -1234567890123456789,
                file_reference: vec![1, 2, 3, 0, 0, 4],
                dc_id: 4,
                size: 1_048_576,
                mime_type: "application/octet-stream".into(),
                attributes,
            }))),
        })
    }

    #[test]
    fn named_document_becomes_a_file() {
        let file = classify(&document(vec![DocumentAttribute::Filename("notes.pdf".into())])).unwrap();
        assert_eq!(file.name, "notes.pdf");
        assert_eq!(file.file_type, FileType::Document);
        assert_eq!(file.size, 1_048_576);
        assert_eq!(file.saved_at, 1_700_000_123);
        assert_eq!(file.unique_id.len(), FILE_KEY_LEN);
        let expected = FileId::document(
            FileIdType::Document,
            4,
            5678901234567890123,
            -1234567890123456789,
            vec![1, 2, 3, 0, 0, 4],
        )
        .encode();
        assert_eq!(file.file_handle, expected);
    }

    #[test]
    fn video_and_audio_attributes_set_the_type() {
        let video = classify(&document(vec![
            DocumentAttribute::Video { duration_secs: 60 },
            DocumentAttribute::Filename("clip.mp4".into()),
        ]))
        .unwrap();
        assert_eq!(video.file_type, FileType::Video);

        let voice = classify(&document(vec![
            DocumentAttribute::Audio { voice: true },
            DocumentAttribute::Filename("memo.ogg".into()),
        ]))
        .unwrap();
        assert_eq!(voice.file_type, FileType::Voice);

        let audio = classify(&document(vec![
            DocumentAttribute::Audio { voice: false },
            DocumentAttribute::Filename("song.mp3".into()),
        ]))
        .unwrap();
        assert_eq!(audio.file_type, FileType::Audio);
        assert_ne!(audio.file_handle, voice.file_handle);
    }

    #[test]
    fn stickers_animations_and_images_are_rejected() {
        for attr in [
            DocumentAttribute::Sticker,
            DocumentAttribute::Animated,
            DocumentAttribute::HasStickers,
            DocumentAttribute::ImageSize {
                width: 512,
                height: 512,
            },
        ] {
            let msg = document(vec![attr, DocumentAttribute::Filename("x.webp".into())]);
            assert_eq!(classify(&msg), Err(Rejection::UnsupportedDocument));
        }
    }

    #[test]
    fn missing_or_empty_filename_is_rejected() {
        assert_eq!(classify(&document(vec![])), Err(Rejection::MissingFilename));
        assert_eq!(
            classify(&document(vec![DocumentAttribute::Filename(String::new())])),
            Err(Rejection::MissingFilename)
        );
    }

    #[test]
    fn non_document_entries_are_rejected() {
        let no_media = FetchedMessage::Regular(RawMessage {
            id: 1,
            date: 0,
            media: None,
        });
        assert_eq!(classify(&no_media), Err(Rejection::NoMedia));

        let photo = FetchedMessage::Regular(RawMessage {
            id: 1,
            date: 0,
            media: Some(RawMedia::Photo),
        });
        assert!(matches!(classify(&photo), Err(Rejection::UnsupportedMedia(_))));

        let empty_doc = FetchedMessage::Regular(RawMessage {
            id: 1,
            date: 0,
            media: Some(RawMedia::Document(None)),
        });
        assert_eq!(classify(&empty_doc), Err(Rejection::EmptyDocument));

        assert_eq!(classify(&FetchedMessage::Service { id: 3 }), Err(Rejection::Service));
        assert_eq!(classify(&FetchedMessage::Empty { id: 4 }), Err(Rejection::Empty));
        assert_eq!(message_id(&FetchedMessage::Empty { id: 4 }), 4);
    }
}
