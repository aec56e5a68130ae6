//! Deterministic item emission
//!
//! Items accumulate in traversal order, each tagged with its begin
//! location and a local tiebreak. A stable sort by `(location,
//! local_order)` produces the final stream: source order wins, the local
//! order fixes the relative position of items sharing a location (a
//! record and the special members emitted at its opening brace), and
//! items with invalid locations sort before everything else.

use crate::ir::Item;

pub(crate) const ORDER_COMMENT: u8 = 0;
pub(crate) const ORDER_RECORD: u8 = 0;
// 1 is reserved for nested record shells, which are currently rejected
// before emission.
pub(crate) const ORDER_CTOR_DEFAULT: u8 = 2;
pub(crate) const ORDER_CTOR_COPY: u8 = 3;
pub(crate) const ORDER_CTOR_MOVE: u8 = 4;
pub(crate) const ORDER_CTOR_OTHER: u8 = 5;
pub(crate) const ORDER_DTOR: u8 = 6;
pub(crate) const ORDER_OTHER: u8 = 7;

/// One buffered item. `sort_loc` is `None` for invalid source locations,
/// which `Option`'s ordering places first.
pub(crate) struct EmitEntry {
    pub(crate) sort_loc: Option<(u32, u32)>,
    pub(crate) local_order: u8,
    pub(crate) item: Item,
}

/// Flatten the buffer into the final item stream.
pub(crate) fn flatten(mut entries: Vec<EmitEntry>) -> Vec<Item> {
    // sort_by_key is stable: entries that tie on both keys keep their
    // traversal order.
    entries.sort_by_key(|e| (e.sort_loc, e.local_order));
    entries.into_iter().map(|e| e.item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Comment;

    fn comment(text: &str) -> Item {
        Item::Comment(Comment {
            text: text.to_string(),
        })
    }

    fn text_of(item: &Item) -> &str {
        match item {
            Item::Comment(c) => &c.text,
            _ => panic!("not a comment"),
        }
    }

    #[test]
    fn test_sorts_by_location() {
        let items = flatten(vec![
            EmitEntry {
                sort_loc: Some((0, 5)),
                local_order: ORDER_OTHER,
                item: comment("second"),
            },
            EmitEntry {
                sort_loc: Some((0, 1)),
                local_order: ORDER_OTHER,
                item: comment("first"),
            },
        ]);
        assert_eq!(text_of(&items[0]), "first");
        assert_eq!(text_of(&items[1]), "second");
    }

    #[test]
    fn test_local_order_breaks_location_ties() {
        let items = flatten(vec![
            EmitEntry {
                sort_loc: Some((0, 3)),
                local_order: ORDER_DTOR,
                item: comment("dtor"),
            },
            EmitEntry {
                sort_loc: Some((0, 3)),
                local_order: ORDER_RECORD,
                item: comment("record"),
            },
            EmitEntry {
                sort_loc: Some((0, 3)),
                local_order: ORDER_CTOR_COPY,
                item: comment("copy"),
            },
        ]);
        assert_eq!(text_of(&items[0]), "record");
        assert_eq!(text_of(&items[1]), "copy");
        assert_eq!(text_of(&items[2]), "dtor");
    }

    #[test]
    fn test_invalid_locations_sort_first() {
        let items = flatten(vec![
            EmitEntry {
                sort_loc: Some((0, 1)),
                local_order: ORDER_OTHER,
                item: comment("located"),
            },
            EmitEntry {
                sort_loc: None,
                local_order: ORDER_OTHER,
                item: comment("unlocated"),
            },
        ]);
        assert_eq!(text_of(&items[0]), "unlocated");
        assert_eq!(text_of(&items[1]), "located");
    }

    #[test]
    fn test_full_ties_keep_insertion_order() {
        let items = flatten(vec![
            EmitEntry {
                sort_loc: Some((0, 2)),
                local_order: ORDER_COMMENT,
                item: comment("a"),
            },
            EmitEntry {
                sort_loc: Some((0, 2)),
                local_order: ORDER_COMMENT,
                item: comment("b"),
            },
        ]);
        assert_eq!(text_of(&items[0]), "a");
        assert_eq!(text_of(&items[1]), "b");
    }
}
