use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use shelfscan_core::{Entity, ItemId};

use crate::code::{CodeKind, IdentifyingCode};

/// Display metadata of a catalog entry. Opaque to matching.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,

    /// Every other field of the record (author, price, shelf, ...), kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
}

/// Catalog record as it appears in the static catalog file.
///
/// ```json
/// {"id": 1, "jan": "4901234567894", "isbn": "978-4-06-519351-1", "title": "A"}
/// ```
///
/// `jan` is the primary code; `isbn`, `material_cd` and the optional `codes`
/// array are alternates. Codes may be written as strings or bare numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: ItemId,

    #[serde(default, deserialize_with = "lenient_code", skip_serializing_if = "Option::is_none")]
    pub jan: Option<String>,

    #[serde(default, deserialize_with = "lenient_code", skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,

    #[serde(default, deserialize_with = "lenient_code", skip_serializing_if = "Option::is_none")]
    pub material_cd: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub codes: Vec<String>,

    #[serde(flatten)]
    pub display: DisplayFields,
}

impl ItemRecord {
    pub fn new(id: ItemId) -> Self {
        Self {
            id,
            jan: None,
            isbn: None,
            material_cd: None,
            codes: Vec::new(),
            display: DisplayFields::default(),
        }
    }

    pub fn with_jan(mut self, jan: impl Into<String>) -> Self {
        self.jan = Some(jan.into());
        self
    }

    pub fn with_isbn(mut self, isbn: impl Into<String>) -> Self {
        self.isbn = Some(isbn.into());
        self
    }

    pub fn with_material_cd(mut self, material_cd: impl Into<String>) -> Self {
        self.material_cd = Some(material_cd.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.codes.push(code.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.display.title = Some(title.into());
        self
    }
}

fn lenient_code<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCode {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Option::<RawCode>::deserialize(deserializer)? {
        None => None,
        Some(RawCode::Text(s)) => Some(s),
        Some(RawCode::Number(n)) => Some(n.to_string()),
    })
}

/// A catalog item inside the inventory store.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    record: ItemRecord,
    /// Position in the catalog as loaded (0-based).
    position: usize,
    codes: Vec<IdentifyingCode>,
}

impl Item {
    pub fn from_record(position: usize, record: ItemRecord) -> Self {
        let mut codes = Vec::new();
        let candidates = [
            (CodeKind::Jan, record.jan.as_deref()),
            (CodeKind::Isbn, record.isbn.as_deref()),
            (CodeKind::MaterialCode, record.material_cd.as_deref()),
        ]
        .into_iter()
        .filter_map(|(kind, raw)| raw.map(|r| (kind, r)))
        .chain(record.codes.iter().map(|c| (CodeKind::Other, c.as_str())));

        for (kind, raw) in candidates {
            if let Some(code) = IdentifyingCode::new(kind, raw) {
                codes.push(code);
            }
        }

        Self {
            record,
            position,
            codes,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn codes(&self) -> &[IdentifyingCode] {
        &self.codes
    }

    /// The primary (JAN) code, if the record has one.
    pub fn primary_code(&self) -> Option<&IdentifyingCode> {
        self.codes.iter().find(|c| c.kind() == CodeKind::Jan)
    }

    pub fn title(&self) -> Option<&str> {
        self.record.display.title.as_deref()
    }

    pub fn display(&self) -> &DisplayFields {
        &self.record.display
    }

    pub fn record(&self) -> &ItemRecord {
        &self.record
    }

    /// Whether any identifying code equals the (already normalized) symbol.
    pub fn matches_normalized(&self, symbol: &str) -> bool {
        self.codes.iter().any(|c| c.matches_normalized(symbol))
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.record.id
    }
}
