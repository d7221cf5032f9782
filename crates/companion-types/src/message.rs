use serde::{Deserialize, Serialize};

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
    System,
}

/// Thumbs up/down left on a model reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Up,
    Down,
}

/// A web source the model cited for its reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingLink {
    pub title: String,
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// A single message in a conversation.
///
/// Messages are append-only within a session; `feedback` is the one field
/// mutated in place (by id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub text: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Attached picture as a data URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grounding_data: Vec<GroundingLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_emergency: bool,
}

impl Message {
    fn with_role(role: Role, text: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: new_message_id(),
            role,
            text: text.into(),
            timestamp,
            image: None,
            grounding_data: Vec::new(),
            feedback: None,
            is_emergency: false,
        }
    }

    pub fn user(text: impl Into<String>, timestamp: i64) -> Self {
        Self::with_role(Role::User, text, timestamp)
    }

    pub fn model(text: impl Into<String>, timestamp: i64) -> Self {
        Self::with_role(Role::Model, text, timestamp)
    }

    pub fn system(text: impl Into<String>, timestamp: i64) -> Self {
        Self::with_role(Role::System, text, timestamp)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_image(mut self, image: Option<String>) -> Self {
        self.image = image;
        self
    }

    pub fn with_grounding(mut self, links: Vec<GroundingLink>) -> Self {
        self.grounding_data = links;
        self
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// Fresh message id; unique within a session regardless of clock resolution.
pub fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
