use super::SheetKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed has a header row but no data rows")]
    Empty,
}

/// A single parsed cell. Which variant a header produces is decided by the
/// header's identity, not the cell contents: identifier-like headers always
/// coerce to `Int`, price-like headers to `Price`.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Int(u32),
    Price(Option<f64>),
}

impl Cell {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(value) => Some(value),
            _ => None,
        }
    }
}

/// One data row keyed by the verbatim header names, in header order.
#[derive(Debug, Clone)]
pub struct RawRow {
    cells: Vec<(String, Cell)>,
}

impl RawRow {
    pub fn get(&self, header: &str) -> Option<&Cell> {
        self.cells
            .iter()
            .find(|(name, _)| name == header)
            .map(|(_, cell)| cell)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.cells
            .iter()
            .map(|(name, cell)| (name.as_str(), cell))
    }

    #[cfg(test)]
    pub(crate) fn from_cells(cells: Vec<(String, Cell)>) -> Self {
        Self { cells }
    }
}

/// Parse the spreadsheet's CSV export: first row is the header, every
/// following row becomes a `RawRow`. Header names keep their spelling
/// (spaces and accents included) after quote stripping. A header-only feed
/// is reported as `FeedError::Empty` so callers can tell "nothing
/// published" apart from "everything filtered".
pub fn parse_rows(text: &str, kind: SheetKind) -> Result<Vec<RawRow>, FeedError> {
    let lines: Vec<&str> = text.trim().split('\n').collect();
    if lines.len() < 2 {
        return Err(FeedError::Empty);
    }

    let headers: Vec<String> = lines[0].split(',').map(clean_cell).collect();

    let rows = lines[1..]
        .iter()
        .map(|line| {
            let values: Vec<String> = line.split(',').map(clean_cell).collect();
            let cells = headers
                .iter()
                .enumerate()
                .map(|(index, header)| {
                    let value = values.get(index).map(String::as_str).unwrap_or("");
                    (header.clone(), coerce(header, value, kind))
                })
                .collect();
            RawRow { cells }
        })
        .collect();

    Ok(rows)
}

fn clean_cell(raw: &str) -> String {
    raw.trim().trim_matches('"').trim().to_string()
}

fn coerce(header: &str, value: &str, kind: SheetKind) -> Cell {
    if kind.id_headers().contains(&header) {
        Cell::Int(value.parse::<u32>().unwrap_or(0))
    } else if kind.price_headers().contains(&header) {
        Cell::Price(parse_price(value))
    } else {
        Cell::Text(value.to_string())
    }
}

/// Prices arrive with currency symbols and thousands separators; anything
/// that does not survive as a finite number becomes `None`, never zero.
fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|ch| !matches!(ch, '$' | ',')).collect();
    if cleaned.trim().is_empty() {
        return None;
    }
    cleaned
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}
