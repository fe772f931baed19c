use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, NodeError>;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("mining result is stale: chain tip moved during the search")]
    StaleWork,
    #[error("mining search was cancelled")]
    MiningCancelled,
    #[error("peer {peer} failed: {reason}")]
    Peer { peer: String, reason: String },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

impl NodeError {
    pub fn peer(peer: impl Into<String>, reason: impl ToString) -> Self {
        NodeError::Peer {
            peer: peer.into(),
            reason: reason.to_string(),
        }
    }
}

impl ResponseError for NodeError {
    fn status_code(&self) -> StatusCode {
        match self {
            NodeError::BadRequest(_) => StatusCode::BAD_REQUEST,
            NodeError::StaleWork | NodeError::MiningCancelled => StatusCode::CONFLICT,
            NodeError::Peer { .. } => StatusCode::BAD_GATEWAY,
            NodeError::Serialization(_) | NodeError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}
