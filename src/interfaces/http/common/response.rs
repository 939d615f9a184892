use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Failure envelope: `{"success": false, "error": "reason"}`.
///
/// Successful calls return their payload bare.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    pub error: String,
}

impl ApiResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}
