//! Symbol → item matching.
//!
//! Linear scan in pending order; first item with a code equal to the
//! normalized symbol wins. No scoring, no fuzzy matching.

use crate::code::normalize_code;
use crate::item::Item;

/// Find the first item in `pending` carrying `symbol` as one of its codes.
pub fn find_match<'a>(symbol: &str, pending: &'a [Item]) -> Option<&'a Item> {
    find_match_index(symbol, pending).map(|index| &pending[index])
}

pub(crate) fn find_match_index(symbol: &str, pending: &[Item]) -> Option<usize> {
    let normalized = normalize_code(symbol);
    if normalized.is_empty() {
        return None;
    }
    pending.iter().position(|item| item.matches_normalized(&normalized))
}

#[cfg(test)]
mod tests {
    use shelfscan_core::{Entity, ItemId};

    use super::*;
    use crate::item::ItemRecord;

    fn items() -> Vec<Item> {
        vec![
            Item::from_record(
                0,
                ItemRecord::new(ItemId::from(1))
                    .with_jan("4901234567894")
                    .with_isbn("978-4-06-519351-1"),
            ),
            Item::from_record(
                1,
                ItemRecord::new(ItemId::from(2))
                    .with_jan("4901234567895")
                    .with_material_cd("M-100"),
            ),
            // Shares a material code with item 2; never reached while 2 is pending.
            Item::from_record(2, ItemRecord::new(ItemId::from(3)).with_material_cd("M100")),
        ]
    }

    #[test]
    fn every_code_of_an_item_matches() {
        let pending = items();
        for symbol in ["4901234567894", "9784065193511", "978-4-06-519351-1"] {
            assert_eq!(find_match(symbol, &pending).unwrap().id().as_str(), "1");
        }
    }

    #[test]
    fn first_match_wins_in_pending_order() {
        let pending = items();
        assert_eq!(find_match("M100", &pending).unwrap().id().as_str(), "2");
        assert_eq!(find_match("M100", &pending[2..]).unwrap().id().as_str(), "3");
    }

    #[test]
    fn unknown_or_blank_symbols_match_nothing() {
        let pending = items();
        assert!(find_match("9999999999999", &pending).is_none());
        assert!(find_match("", &pending).is_none());
        assert!(find_match(" - ", &pending).is_none());
        assert!(find_match("m-100", &pending).is_none());
    }
}
