//! Standardized API error body.
//!
//! Every domain failure reaches the client as a status code plus this
//! `{message}` shape; internal detail stays in the logs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
