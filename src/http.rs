use reqwest::Client;
use std::time::Duration;

/// Identifies outbound requests to the spreadsheet export and image origins.
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; ZaharaBot/1.0)";

pub fn build_client() -> Client {
    let timeout = std::env::var("HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(15);
    let connect = std::env::var("HTTP_CONNECT_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(5);
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout))
        .connect_timeout(Duration::from_secs(connect))
        .build()
        .unwrap_or_else(|_| Client::new())
}
