use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ApiError {
    pub fn new(error: &str, detail: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            detail: Some(detail.into()),
        }
    }

    pub fn bare(error: &str) -> Self {
        Self {
            error: error.to_string(),
            detail: None,
        }
    }
}
