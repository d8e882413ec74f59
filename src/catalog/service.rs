use super::cache::FeedCache;
use super::csv::{self, FeedError};
use super::{Item, SheetKind};
use crate::config;
use reqwest::Client;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};

/// The three outcomes a caller must be able to tell apart: the upstream
/// spreadsheet was unreachable, it answered but published no rows, or the
/// requested item simply is not in it.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("spreadsheet fetch failed: {0}")]
    Transport(String),
    #[error("feed has no data rows")]
    EmptyFeed,
    #[error("item {0} not found")]
    NotFound(String),
}

impl From<FeedError> for CatalogError {
    fn from(value: FeedError) -> Self {
        match value {
            FeedError::Empty => CatalogError::EmptyFeed,
        }
    }
}

#[derive(Clone)]
pub struct CatalogService {
    http: Client,
    cache: FeedCache,
}

impl CatalogService {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            cache: FeedCache::from_env(),
        }
    }

    /// Every valid item of the sheet, in source order. A feed whose rows
    /// all fail validation is an empty listing, not an error.
    pub async fn list_all(&self, kind: SheetKind) -> Result<Vec<Item>, CatalogError> {
        self.items(kind).await
    }

    /// Single-item lookup. The requested id arrives as a string and is
    /// compared against the item id's decimal form.
    pub async fn get_by_id(&self, kind: SheetKind, id: &str) -> Result<Item, CatalogError> {
        let items = self.items(kind).await?;
        select_item(items, id)
    }

    async fn items(&self, kind: SheetKind) -> Result<Vec<Item>, CatalogError> {
        let http = self.http.clone();
        self.cache
            .get_or_fetch(kind, || async move { fetch_feed(&http, kind).await })
            .await
    }
}

fn select_item(items: Vec<Item>, id: &str) -> Result<Item, CatalogError> {
    items
        .into_iter()
        .find(|item| item.id.to_string() == id)
        .ok_or_else(|| CatalogError::NotFound(id.to_string()))
}

async fn fetch_feed(http: &Client, kind: SheetKind) -> Result<Vec<Item>, CatalogError> {
    let url = config::csv_export_url(kind.gid());
    let started = Instant::now();

    let response = http.get(&url).send().await.map_err(|err| {
        warn!(
            target = "zahara.catalog",
            sheet = kind.label(),
            error = %err,
            "sheet_fetch_failed"
        );
        // The error's display form can embed the request URL; strip it
        // before it reaches a client-facing body.
        CatalogError::Transport(err.without_url().to_string())
    })?;

    if !response.status().is_success() {
        return Err(CatalogError::Transport(format!(
            "HTTP {}",
            response.status()
        )));
    }

    let text = response
        .text()
        .await
        .map_err(|err| CatalogError::Transport(err.without_url().to_string()))?;
    crate::metrics::upstream_elapsed("sheet_csv", started.elapsed().as_millis());

    let items = build_items(&text, kind)?;
    debug!(
        target = "zahara.catalog",
        sheet = kind.label(),
        items = items.len(),
        "feed_parsed"
    );
    Ok(items)
}

/// Parse and validate a CSV feed into items; the pure core of the fetch
/// path.
pub fn build_items(text: &str, kind: SheetKind) -> Result<Vec<Item>, CatalogError> {
    let rows = csv::parse_rows(text, kind)?;
    Ok(rows
        .iter()
        .filter_map(|row| Item::from_row(row, kind))
        .collect())
}
