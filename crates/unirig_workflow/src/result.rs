//! Engine result mapping.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use unirig_core::NodeId;

/// Values one node produced, in output-slot order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeOutputs {
    /// Positional outputs
    #[serde(default)]
    pub outputs: Vec<Value>,
}

impl NodeOutputs {
    /// Create from a list of values
    #[must_use]
    pub fn new(outputs: Vec<Value>) -> Self {
        Self { outputs }
    }

    /// Value at an output slot
    #[must_use]
    pub fn get(&self, index: u32) -> Option<&Value> {
        self.outputs.get(index as usize)
    }
}

/// What the engine hands back for one executed graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineResult {
    /// Outputs of every node that ran
    #[serde(default)]
    pub outputs: IndexMap<NodeId, NodeOutputs>,
    /// Wall time spent executing, in seconds
    pub execution_time: f64,
}

impl EngineResult {
    /// Create an empty result
    #[must_use]
    pub fn new(execution_time: f64) -> Self {
        Self {
            outputs: IndexMap::new(),
            execution_time,
        }
    }

    /// Record a node's outputs
    #[must_use]
    pub fn with_node(mut self, id: NodeId, outputs: Vec<Value>) -> Self {
        self.outputs.insert(id, NodeOutputs::new(outputs));
        self
    }

    /// Outputs of one node
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&NodeOutputs> {
        self.outputs.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_engine_payload() {
        let raw = json!({
            "outputs": {
                "3": {"outputs": ["/out/rigged.fbx", {"bones": 52}]},
                "1": {"outputs": []}
            },
            "execution_time": 12.5
        });
        let result: EngineResult = serde_json::from_value(raw).unwrap();
        assert_eq!(result.execution_time, 12.5);
        let rig = result.node(&NodeId::from_index(3)).unwrap();
        assert_eq!(rig.get(0), Some(&json!("/out/rigged.fbx")));
        assert!(rig.get(2).is_none());
        assert!(result.node(&NodeId::from_index(1)).unwrap().outputs.is_empty());
    }

    #[test]
    fn test_missing_outputs_default() {
        let result: EngineResult = serde_json::from_value(json!({"execution_time": 0.5})).unwrap();
        assert!(result.outputs.is_empty());
        assert_eq!(result.execution_time, 0.5);
    }

    #[test]
    fn test_execution_time_required() {
        let err = serde_json::from_value::<EngineResult>(json!({"outputs": {}})).unwrap_err();
        assert!(err.to_string().contains("execution_time"));
    }
}
