use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::enums::Category;

/// A governance document as handed over by the ingestion side.
///
/// Immutable once ingested. The pipeline only ever borrows these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    /// Original file name, used by generated output to cite the source.
    pub title: String,
    pub category: Category,
    /// Extracted text of the whole document.
    pub content: String,
    /// SHA-256 of `content`, base64.
    pub fingerprint: String,
}

impl Document {
    pub fn new(id: &str, title: &str, category: Category, content: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            category,
            content: content.to_string(),
            fingerprint: content_fingerprint(content),
        }
    }

    /// Whether `reference` (an id or a file name) points at this document.
    pub fn matches_reference(&self, reference: &str) -> bool {
        let reference = reference.trim();
        self.id == reference || self.title.eq_ignore_ascii_case(reference)
    }
}

/// Compute SHA-256 content hash for document text
pub fn content_fingerprint(content: &str) -> String {
    let hash = Sha256::digest(content.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(hash)
}

/// Short hex digest used for audit `input_hash` values.
pub fn short_hash(input: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(input.as_bytes()));
    digest[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_deterministic() {
        let a = Document::new("d1", "a.txt", Category::Minutes, "Quorum was confirmed.");
        let b = Document::new("d2", "b.txt", Category::Minutes, "Quorum was confirmed.");
        assert_eq!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn different_content_different_fingerprint() {
        assert_ne!(content_fingerprint("Content A"), content_fingerprint("Content B"));
    }

    #[test]
    fn matches_by_id_or_title() {
        let doc = Document::new("doc-7", "Board_Minutes_Feb.pdf", Category::Minutes, "x");
        assert!(doc.matches_reference("doc-7"));
        assert!(doc.matches_reference("board_minutes_feb.pdf"));
        assert!(doc.matches_reference("  Board_Minutes_Feb.pdf "));
        assert!(!doc.matches_reference("Board_Minutes_Mar.pdf"));
    }

    #[test]
    fn short_hash_is_16_hex_chars() {
        let h = short_hash("minutes_analyzer:doc-1,doc-2");
        assert_eq!(h.len(), 16);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(h, short_hash("minutes_analyzer:doc-1,doc-2"));
    }
}
