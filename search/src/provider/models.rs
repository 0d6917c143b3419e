use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{serde_as, DisplayFromStr};

/// A block as served by the sidecar, with decoded extrinsics and events.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde_as(as = "DisplayFromStr")]
    pub number: u64,
    pub hash: String,
    pub parent_hash: String,
    #[serde(default)]
    pub on_initialize: EventGroup,
    #[serde(default)]
    pub extrinsics: Vec<Extrinsic>,
    #[serde(default)]
    pub on_finalize: EventGroup,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventGroup {
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub method: RecordMethod,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extrinsic {
    pub method: RecordMethod,
    #[serde(default)]
    pub signature: Option<Value>,
    #[serde(default)]
    pub args: Value,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub success: Option<bool>,
}

/// Pallet-qualified name of a call or event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMethod {
    pub pallet: String,
    pub method: String,
}

impl Block {
    /// Events in block order: on-initialize first, then per-extrinsic,
    /// then on-finalize. This matches the chain's event index ordering.
    pub fn events(&self) -> Vec<Event> {
        let mut events = self.on_initialize.events.clone();
        for extrinsic in &self.extrinsics {
            events.extend(extrinsic.events.iter().cloned());
        }
        events.extend(self.on_finalize.events.iter().cloned());
        events
    }
}
