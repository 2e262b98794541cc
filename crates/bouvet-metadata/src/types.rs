//! Persisted pod sandbox record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle state of a pod sandbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PodSandboxState {
    /// Sandbox is running and can host containers.
    #[serde(rename = "SANDBOX_READY")]
    Ready,
    /// Sandbox is stopped or not yet fully set up.
    #[serde(rename = "SANDBOX_NOTREADY")]
    NotReady,
}

impl fmt::Display for PodSandboxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => write!(f, "SANDBOX_READY"),
            Self::NotReady => write!(f, "SANDBOX_NOTREADY"),
        }
    }
}

/// Sandbox configuration as supplied by the orchestrator at creation time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSandboxConfig {
    /// Pod name.
    #[serde(default)]
    pub name: String,
    /// Pod UID assigned by the orchestrator.
    #[serde(default)]
    pub uid: String,
    /// Pod namespace.
    #[serde(default)]
    pub namespace: String,
    /// Creation attempt counter.
    #[serde(default)]
    pub attempt: u32,
    /// Hostname inside the sandbox.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hostname: String,
    /// Directory for container logs on the host.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub log_directory: String,
    /// Key/value labels used for selection.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Free-form annotations.
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    /// Any other fields, kept as-is.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A persisted pod sandbox record.
///
/// `pod_id` is never written into the payload; it is restored from the
/// storage region name whenever a record is read back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSandboxInfo {
    /// Sandbox identifier.
    #[serde(skip)]
    pub pod_id: String,
    /// Configuration the sandbox was created with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<PodSandboxConfig>,
    /// Creation timestamp assigned by the agent.
    pub created_at: DateTime<Utc>,
    /// Current lifecycle state.
    pub state: PodSandboxState,
    /// Fields this crate does not interpret (network setup etc.).
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl PodSandboxInfo {
    /// Create a record stamped with the current time.
    pub fn new(config: PodSandboxConfig, state: PodSandboxState) -> Self {
        Self {
            pod_id: String::new(),
            config: Some(config),
            created_at: Utc::now(),
            state,
            extra: BTreeMap::new(),
        }
    }

    /// Labels of the sandbox (empty when no config was stored).
    pub fn labels(&self) -> &BTreeMap<String, String> {
        static EMPTY: BTreeMap<String, String> = BTreeMap::new();
        self.config.as_ref().map_or(&EMPTY, |c| &c.labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(format!("{}", PodSandboxState::Ready), "SANDBOX_READY");
        assert_eq!(format!("{}", PodSandboxState::NotReady), "SANDBOX_NOTREADY");
    }

    #[test]
    fn test_pod_id_not_serialized() {
        let mut info = PodSandboxInfo::new(PodSandboxConfig::default(), PodSandboxState::Ready);
        info.pod_id = "pod-1".to_string();

        let json = serde_json::to_value(&info).expect("serialize");
        assert!(json.get("podId").is_none());
        assert_eq!(json["state"], "SANDBOX_READY");

        let back: PodSandboxInfo = serde_json::from_value(json).expect("deserialize");
        assert!(back.pod_id.is_empty());
    }

    #[test]
    fn test_unknown_fields_pass_through() {
        let raw = r#"{
            "config": {"name": "web", "labels": {"env": "prod"}, "dnsConfig": {"servers": ["1.1.1.1"]}},
            "createdAt": "2024-01-01T00:00:00Z",
            "state": "SANDBOX_NOTREADY",
            "containerSideNetwork": {"mtu": 1500}
        }"#;

        let info: PodSandboxInfo = serde_json::from_str(raw).expect("deserialize");
        assert_eq!(info.state, PodSandboxState::NotReady);
        assert_eq!(info.labels().get("env").map(String::as_str), Some("prod"));
        assert!(info.extra.contains_key("containerSideNetwork"));

        let json = serde_json::to_value(&info).expect("serialize");
        assert_eq!(json["containerSideNetwork"]["mtu"], 1500);
        assert_eq!(json["config"]["dnsConfig"]["servers"][0], "1.1.1.1");
    }

    #[test]
    fn test_labels_without_config() {
        let mut info = PodSandboxInfo::new(PodSandboxConfig::default(), PodSandboxState::Ready);
        info.config = None;
        assert!(info.labels().is_empty());
    }
}
