//! Text panels beside the charts: the read-only member listing and the
//! per-member overwrite entry fields.

use crate::models::Overwrite;
use crate::state::{SeriesKind, Store};

/// Member values of one series, one per line with two decimals, in
/// server order. Used for the raw and modified forecast panels.
pub fn member_lines(store: &Store, kind: SeriesKind) -> String {
    store
        .series(kind)
        .values
        .iter()
        .map(|v| format!("{:.2}", v))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One entry field per ensemble member, prefilled with any overwrite
/// currently recorded for that member and blank otherwise.
pub fn overwrite_fields(member_count: usize, overwrites: &[Overwrite]) -> Vec<String> {
    let mut fields = vec![String::new(); member_count];
    for overwrite in overwrites {
        if let Some(field) = fields.get_mut(overwrite.index) {
            *field = overwrite.value.to_string();
        }
    }
    fields
}
