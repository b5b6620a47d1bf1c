use serde::{Deserialize, Serialize};

use shelfscan_core::ValueObject;

/// Where an identifying code came from in the catalog record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeKind {
    /// Primary retail code (JAN / EAN-13).
    Jan,
    /// ISBN, usually printed with hyphens.
    Isbn,
    /// Distributor material code.
    MaterialCode,
    /// Any further code listed in the record's `codes` array.
    Other,
}

/// Normalize a code or scanned symbol for comparison.
///
/// Strips every non-alphanumeric character (hyphens, spaces, dots), so
/// `"978-4-06-519351-1"` and `"9784065193511"` compare equal. Case is kept:
/// material codes that differ only in case are different codes.
pub fn normalize_code(raw: &str) -> String {
    raw.chars().filter(|c| c.is_alphanumeric()).collect()
}

/// One identifying code of an item: the raw catalog text plus its normalized form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentifyingCode {
    kind: CodeKind,
    raw: String,
    normalized: String,
}

impl IdentifyingCode {
    /// Returns `None` when nothing comparable is left after normalization.
    pub fn new(kind: CodeKind, raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let normalized = normalize_code(&raw);
        if normalized.is_empty() {
            return None;
        }
        Some(Self {
            kind,
            raw,
            normalized,
        })
    }

    pub fn kind(&self) -> CodeKind {
        self.kind
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Compare against an already-normalized symbol.
    pub fn matches_normalized(&self, symbol: &str) -> bool {
        self.normalized == symbol
    }
}

impl ValueObject for IdentifyingCode {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_separators() {
        assert_eq!(normalize_code("978-4-06-519351-1"), "9784065193511");
        assert_eq!(normalize_code(" 4901234 567894 "), "4901234567894");
        assert_eq!(normalize_code("4-06-519351-X"), "406519351X");
    }

    #[test]
    fn letter_case_is_significant() {
        assert_eq!(normalize_code("mat-0042"), "mat0042");
        let code = IdentifyingCode::new(CodeKind::MaterialCode, "MAT-0042").unwrap();
        assert!(code.matches_normalized(&normalize_code("MAT 0042")));
        assert!(!code.matches_normalized(&normalize_code("mat0042")));
    }

    #[test]
    fn blank_codes_are_dropped() {
        assert!(IdentifyingCode::new(CodeKind::Isbn, "---").is_none());
        assert!(IdentifyingCode::new(CodeKind::Jan, "").is_none());
    }

    #[test]
    fn keeps_raw_text_for_display() {
        let code = IdentifyingCode::new(CodeKind::Isbn, "978-4-00-310101-9").unwrap();
        assert_eq!(code.raw(), "978-4-00-310101-9");
        assert_eq!(code.normalized(), "9784003101019");
        assert!(code.matches_normalized("9784003101019"));
        assert_eq!(code.kind(), CodeKind::Isbn);
    }
}
