//! Payloads exchanged with the AI collaborator.

use serde::{Deserialize, Serialize};
use crate::message::GroundingLink;

/// Device position attached to a turn when the user asks about nearby help
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// The model's answer to one conversation turn
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnReply {
    pub text: String,
    #[serde(default)]
    pub grounding_links: Vec<GroundingLink>,
}

/// Gentle insight summary over a whole conversation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub distortions: Vec<String>,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// What the background analysis service sends back after a sync
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncOutcome {
    #[serde(default, rename = "suggested_title")]
    pub suggested_title: Option<String>,
}
