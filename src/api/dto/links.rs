//! DTOs for link listing and deletion.

use serde::{Deserialize, Serialize};

use super::shorten::LinkResponse;

/// Query parameters for `GET /`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Include soft-deleted links (default: false).
    #[serde(default)]
    pub include_deleted: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LinkListResponse {
    pub total: usize,
    pub items: Vec<LinkResponse>,
}

/// Plain confirmation body.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
