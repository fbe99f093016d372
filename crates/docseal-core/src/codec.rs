//! Signature embedding codec.
//!
//! A signed document is the original bytes followed by one marker block:
//!
//! ```text
//! <original bytes>\n\n--- SIGNATURE START ---\n<base64 signature>\n--- SIGNATURE END ---
//! ```
//!
//! Extraction works on raw bytes, so non-UTF-8 documents survive untouched.
//! If the original itself contains marker text the first start marker and
//! the first end marker after it win.

pub const START_MARKER: &[u8] = b"\n\n--- SIGNATURE START ---\n";
pub const END_MARKER: &[u8] = b"\n--- SIGNATURE END ---";

/// A document split back into its original bytes and signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub original: Vec<u8>,
    pub signature: String,
}

pub fn embed_signature(original: &[u8], signature_b64: &str) -> Vec<u8> {
    let signature = signature_b64.as_bytes();
    let mut out =
        Vec::with_capacity(original.len() + START_MARKER.len() + signature.len() + END_MARKER.len());
    out.extend_from_slice(original);
    out.extend_from_slice(START_MARKER);
    out.extend_from_slice(signature);
    out.extend_from_slice(END_MARKER);
    out
}

/// Split a composite document. `None` when no complete marker block exists
/// or the enclosed signature is not text.
pub fn extract_signature(composite: &[u8]) -> Option<Extracted> {
    let start = find(composite, START_MARKER, 0)?;
    let sig_start = start + START_MARKER.len();
    let end = find(composite, END_MARKER, sig_start)?;
    let span_end = end + END_MARKER.len();

    let signature = std::str::from_utf8(&composite[sig_start..end])
        .ok()?
        .trim()
        .to_string();

    let mut original = Vec::with_capacity(composite.len() - (span_end - start));
    original.extend_from_slice(&composite[..start]);
    original.extend_from_slice(&composite[span_end..]);

    Some(Extracted {
        original,
        signature,
    })
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SIG: &str = "c2lnbmF0dXJlLWJ5dGVz";

    #[test]
    fn embed_appends_verbatim_block() {
        let composite = embed_signature(b"hello", SIG);
        assert_eq!(
            composite,
            b"hello\n\n--- SIGNATURE START ---\nc2lnbmF0dXJlLWJ5dGVz\n--- SIGNATURE END ---".to_vec()
        );
    }

    #[test]
    fn extract_inverts_embed() {
        let composite = embed_signature(b"hello", SIG);
        let extracted = extract_signature(&composite).unwrap();
        assert_eq!(extracted.original, b"hello");
        assert_eq!(extracted.signature, SIG);
    }

    #[test]
    fn empty_and_binary_documents_roundtrip() {
        let extracted = extract_signature(&embed_signature(b"", SIG)).unwrap();
        assert!(extracted.original.is_empty());

        let binary = [0xFFu8, 0x00, 0xFE, 0x80, b'\n'];
        let extracted = extract_signature(&embed_signature(&binary, SIG)).unwrap();
        assert_eq!(extracted.original, binary);
    }

    #[test]
    fn no_marker_block_is_absent() {
        assert_eq!(extract_signature(b"plain document"), None);
        assert_eq!(extract_signature(b""), None);
        // Start without end is not a block.
        assert_eq!(extract_signature(b"doc\n\n--- SIGNATURE START ---\nabc"), None);
        // End before start does not count either.
        assert_eq!(
            extract_signature(b"\n--- SIGNATURE END ---doc\n\n--- SIGNATURE START ---\nabc"),
            None
        );
    }

    #[test]
    fn first_end_marker_terminates_the_block() {
        let mut composite = embed_signature(b"doc", "AAAA");
        composite.extend_from_slice(b" trailing\n--- SIGNATURE END ---");
        let extracted = extract_signature(&composite).unwrap();
        assert_eq!(extracted.signature, "AAAA");
        assert_eq!(extracted.original, b"doc trailing\n--- SIGNATURE END ---");
    }

    #[test]
    fn inline_block_is_removed_in_place() {
        let mut composite = b"head".to_vec();
        composite.extend_from_slice(&embed_signature(b"", "QUJD"));
        composite.extend_from_slice(b"tail");
        let extracted = extract_signature(&composite).unwrap();
        assert_eq!(extracted.original, b"headtail");
        assert_eq!(extracted.signature, "QUJD");
    }

    #[test]
    fn non_utf8_signature_is_absent() {
        let mut composite = b"doc".to_vec();
        composite.extend_from_slice(START_MARKER);
        composite.extend_from_slice(&[0xC3, 0x28]);
        composite.extend_from_slice(END_MARKER);
        assert_eq!(extract_signature(&composite), None);
    }

    fn marker_free(bytes: &[u8]) -> bool {
        find(bytes, b"--- SIGNATURE", 0).is_none()
    }

    proptest! {
        #[test]
        fn roundtrip_law(
            original in proptest::collection::vec(any::<u8>(), 0..512)
                .prop_filter("marker-free", |b| marker_free(b)),
            raw_sig in proptest::collection::vec(any::<u8>(), 1..300),
        ) {
            use base64::{engine::general_purpose, Engine as _};
            let sig = general_purpose::STANDARD.encode(&raw_sig);
            let extracted = extract_signature(&embed_signature(&original, &sig)).unwrap();
            prop_assert_eq!(extracted.original, original);
            prop_assert_eq!(extracted.signature, sig);
        }
    }
}
