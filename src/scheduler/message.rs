//! Outbound message built when a command fires.

use serde::{Deserialize, Serialize};

use super::command::Attributes;

/// Message handed to the transport layer when a scheduled command fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageBody {
    pub message_type: String,
    #[serde(default)]
    pub attributes: Attributes,
}

impl MessageBody {
    pub fn build(message_type: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            message_type: message_type.into(),
            attributes,
        }
    }
}
