pub mod cache;
pub mod csv;
pub mod item;
pub mod service;

pub use item::Item;
pub use service::{CatalogError, CatalogService};

use crate::config;
use crate::images::ImageKind;

/// The two tabs of the backing spreadsheet. Both share the item shape but
/// differ in which columns carry prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetKind {
    Fragrance,
    Decant,
}

impl SheetKind {
    /// Header aliases tried in order when looking up the row identifier.
    pub fn id_headers(self) -> &'static [&'static str] {
        &["id", "ID de artículo"]
    }

    /// Header aliases tried in order when looking up the item name.
    pub fn name_headers(self) -> &'static [&'static str] {
        &["Nombre", "Producto"]
    }

    /// Columns coerced to nullable floats during parsing.
    pub fn price_headers(self) -> &'static [&'static str] {
        match self {
            SheetKind::Fragrance => &["Precio", "Precio_de_venta"],
            SheetKind::Decant => &["Precio 5 ML", "Precio 10 Ml"],
        }
    }

    pub fn category_header(self) -> &'static str {
        "Tipo"
    }

    pub fn notes_header(self) -> &'static str {
        "Notas"
    }

    pub fn image_header(self) -> &'static str {
        "Imagen_url"
    }

    pub fn gid(self) -> &'static str {
        match self {
            SheetKind::Fragrance => config::CATALOG_GID.as_str(),
            SheetKind::Decant => config::DECANTS_GID.as_str(),
        }
    }

    pub fn image_kind(self) -> ImageKind {
        match self {
            SheetKind::Fragrance => ImageKind::Fragrance,
            SheetKind::Decant => ImageKind::Decant,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SheetKind::Fragrance => "fragrance",
            SheetKind::Decant => "decant",
        }
    }
}
