use super::SheetKind;
use super::csv::{Cell, RawRow};
use crate::images::resolve;
use serde::Serialize;
use serde_with::skip_serializing_none;
use std::collections::BTreeMap;

/// A catalog record in its canonical shape. Recognized columns land in the
/// fixed fields; anything else the sheet carries survives verbatim in
/// `extra`. Prices are keyed by their column name and are either a finite
/// number or `null`.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    pub id: u32,
    pub name: String,
    pub category: Option<String>,
    pub prices: BTreeMap<String, Option<f64>>,
    pub notes: Option<String>,
    /// Proxy reference for the primary display image, or the placeholder.
    pub image: String,
    /// Full ordered gallery, present only when the source listed more than
    /// one candidate.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub gallery: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl Item {
    /// Validate and normalize one parsed row. Returns `None` when the row
    /// has no positive identifier or no non-empty name under any accepted
    /// header alias; such rows are dropped from listings without an error.
    pub fn from_row(row: &RawRow, kind: SheetKind) -> Option<Self> {
        let id = kind.id_headers().iter().find_map(|header| match row.get(header) {
            Some(Cell::Int(value)) if *value > 0 => Some(*value),
            _ => None,
        })?;

        let name = kind.name_headers().iter().find_map(|header| {
            row.get(header)
                .and_then(Cell::as_text)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        })?;

        let category = text_field(row, kind.category_header());
        let notes = text_field(row, kind.notes_header());

        let mut prices = BTreeMap::new();
        for header in kind.price_headers() {
            if let Some(Cell::Price(value)) = row.get(header) {
                prices.insert((*header).to_string(), *value);
            }
        }

        let source = row
            .get(kind.image_header())
            .and_then(Cell::as_text)
            .unwrap_or("");
        let image = resolve::resolve_primary(source, kind.image_kind());
        let mut gallery = resolve::resolve_gallery(source, kind.image_kind());
        if gallery.len() < 2 {
            gallery.clear();
        }

        let mut extra = BTreeMap::new();
        for (header, cell) in row.iter() {
            if is_recognized(header, kind) {
                continue;
            }
            if let Cell::Text(value) = cell
                && !value.is_empty()
            {
                extra.insert(header.to_string(), value.clone());
            }
        }

        Some(Self {
            id,
            name,
            category,
            prices,
            notes,
            image,
            gallery,
            extra,
        })
    }
}

fn text_field(row: &RawRow, header: &str) -> Option<String> {
    row.get(header)
        .and_then(Cell::as_text)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn is_recognized(header: &str, kind: SheetKind) -> bool {
    kind.id_headers().contains(&header)
        || kind.name_headers().contains(&header)
        || kind.price_headers().contains(&header)
        || header == kind.category_header()
        || header == kind.notes_header()
        || header == kind.image_header()
}
