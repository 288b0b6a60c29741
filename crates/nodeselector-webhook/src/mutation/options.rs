use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use k8s_openapi::api::core::v1::Toleration;
use serde::Deserialize;

/// The placement policy enforced on every Pod.
///
/// Loaded once from `MUTATE_OPTIONS` and never changed afterwards.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct MutateOptions {
    /// Replaces the whole `spec.nodeSelector` of the Pod.
    #[serde(rename = "nodeselector", default)]
    pub node_selector: BTreeMap<String, String>,

    /// Replaces the whole `spec.tolerations` of the Pod.
    #[serde(default)]
    pub tolerations: Vec<Toleration>,

    /// Drop `spec.affinity.nodeAffinity` when the Pod declares one.
    #[serde(default)]
    pub remove_node_affinity: bool,
}

impl MutateOptions {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| anyhow!("MUTATE_OPTIONS parse error: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parse_full_options() {
        let raw = r#"
{
    "nodeselector": {"disktype": "ssd", "node-role.kubernetes.io/batch": ""},
    "tolerations": [
        {"key": "dedicated", "operator": "Equal", "value": "batch", "effect": "NoSchedule"},
        {"key": "node.kubernetes.io/not-ready", "operator": "Exists", "effect": "NoExecute", "tolerationSeconds": 300}
    ],
    "remove_node_affinity": true
}
"#;
        let options = MutateOptions::from_json(raw).unwrap();

        assert_eq!(options.node_selector.len(), 2);
        assert_eq!(options.node_selector.get("disktype").unwrap(), "ssd");
        assert!(options.remove_node_affinity);

        assert_eq!(options.tolerations.len(), 2);
        assert_eq!(options.tolerations[0].key.as_deref(), Some("dedicated"));
        assert_eq!(options.tolerations[0].value.as_deref(), Some("batch"));
        assert_eq!(options.tolerations[1].operator.as_deref(), Some("Exists"));
        assert_eq!(options.tolerations[1].toleration_seconds, Some(300));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let options = MutateOptions::from_json(r#"{"nodeselector": {"disktype": "ssd"}}"#).unwrap();

        assert!(options.tolerations.is_empty());
        assert!(!options.remove_node_affinity);
    }

    #[rstest]
    #[case::empty_string("")]
    #[case::not_json("nodeselector=ssd")]
    #[case::truncated(r#"{"nodeselector": {"disktype": "ssd""#)]
    #[case::wrong_type(r#"{"nodeselector": ["ssd"]}"#)]
    #[case::bad_toleration(r#"{"tolerations": [{"tolerationSeconds": "forever"}]}"#)]
    fn malformed_options_are_rejected(#[case] raw: &str) {
        let error = MutateOptions::from_json(raw).unwrap_err();
        assert!(error.to_string().starts_with("MUTATE_OPTIONS parse error"));
    }
}
