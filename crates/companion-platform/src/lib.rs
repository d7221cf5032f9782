//! Browser adapters for the companion-core ports: storage, the Gemini
//! collaborator, the background analysis service and geolocation.

pub mod storage;
pub mod ai;
pub mod location;
