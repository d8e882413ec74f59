pub mod proxy;
pub mod resolve;

/// Type tag carried through proxy references. It only annotates the proxied
/// response; fetch logic is identical for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Fragrance,
    Decant,
}

impl ImageKind {
    pub fn as_query(self) -> &'static str {
        match self {
            ImageKind::Fragrance => "fragrance",
            ImageKind::Decant => "decant",
        }
    }

    pub fn source_label(self) -> &'static str {
        match self {
            ImageKind::Fragrance => "Zahara-Fragrances",
            ImageKind::Decant => "Zahara-Decants",
        }
    }

    /// Unknown or absent tags fall back to `Fragrance`.
    pub fn from_query(raw: &str) -> Self {
        match raw.trim() {
            "decant" => ImageKind::Decant,
            _ => ImageKind::Fragrance,
        }
    }
}
