use once_cell::sync::Lazy;
use std::env;

pub static SPREADSHEET_ID: Lazy<String> = Lazy::new(|| {
    env::var("SHEET_SPREADSHEET_ID")
        .unwrap_or_else(|_| "1a27X7S89kCKffvT690ZAUF9gc6ceer1LGS-bvnchJh8".to_string())
});

pub static CATALOG_GID: Lazy<String> =
    Lazy::new(|| env::var("SHEET_CATALOG_GID").unwrap_or_else(|_| "0".to_string()));

pub static DECANTS_GID: Lazy<String> =
    Lazy::new(|| env::var("SHEET_DECANTS_GID").unwrap_or_else(|_| "150551897".to_string()));

// Service-account credentials for the authenticated Sheets variant. The
// service only reports whether they are present; the public CSV export
// needs none of them.
pub static GOOGLE_PROJECT_ID: Lazy<String> =
    Lazy::new(|| env::var("GOOGLE_PROJECT_ID").unwrap_or_default());

pub static GOOGLE_PRIVATE_KEY: Lazy<String> =
    Lazy::new(|| env::var("GOOGLE_PRIVATE_KEY").unwrap_or_default());

pub static GOOGLE_CLIENT_EMAIL: Lazy<String> =
    Lazy::new(|| env::var("GOOGLE_CLIENT_EMAIL").unwrap_or_default());

pub fn service_account_configured() -> bool {
    !GOOGLE_PROJECT_ID.is_empty()
        && !GOOGLE_PRIVATE_KEY.is_empty()
        && !GOOGLE_CLIENT_EMAIL.is_empty()
}

pub fn csv_export_url(gid: &str) -> String {
    format!(
        "https://docs.google.com/spreadsheets/d/{}/export?format=csv&gid={}",
        *SPREADSHEET_ID, gid
    )
}

pub fn cache_ttl_secs() -> u64 {
    env::var("CATALOG_CACHE_TTL_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(30)
}
