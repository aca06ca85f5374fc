// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property tests for the file id encoder.

use autofilter_fileid::{FileId, FileIdType};
use proptest::prelude::*;

fn any_type() -> impl Strategy<Value = FileIdType> {
    prop_oneof![
        Just(FileIdType::Document),
        Just(FileIdType::Video),
        Just(FileIdType::Audio),
        Just(FileIdType::Voice),
    ]
}

proptest! {
    #[test]
    fn encoding_is_deterministic(
        file_type in any_type(),
        dc in 1i32..6,
        id in any::<i64>(),
        hash in any::<i64>(),
        reference in proptest::collection::vec(any::<u8>(), 0..400),
    ) {
        let a = FileId::document(file_type, dc, id, hash, reference.clone());
        let b = FileId::document(file_type, dc, id, hash, reference);
        prop_assert_eq!(a.encode(), b.encode());
    }

    #[test]
    fn handles_are_unpadded_url_safe_base64(
        file_type in any_type(),
        dc in 1i32..6,
        id in any::<i64>(),
        hash in any::<i64>(),
        reference in proptest::collection::vec(any::<u8>(), 0..400),
    ) {
        let handle = FileId::document(file_type, dc, id, hash, reference).encode();
        prop_assert!(!handle.is_empty());
        prop_assert!(handle
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        prop_assert_eq!(handle.len() % 4 == 1, false);
    }

    #[test]
    fn distinct_documents_get_distinct_handles(
        id in any::<i64>(),
        hash in any::<i64>(),
    ) {
        let a = FileId::document(FileIdType::Document, 2, id, hash, Vec::new()).encode();
        let b = FileId::document(FileIdType::Document, 2, id.wrapping_add(1), hash, Vec::new()).encode();
        prop_assert_ne!(a, b);
    }
}
