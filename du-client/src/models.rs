//! Wire models for hub registry and update service responses

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Status string the hub reports for an online device or module
pub const CONNECTED: &str = "Connected";

/// Twin tag the update service uses to derive group membership
pub const GROUP_TAG: &str = "ADUGroup";

/// Module identity the update agent uses when provisioned as a module
pub const DEVICE_UPDATE_MODULE_ID: &str = "IoTHubDeviceUpdate";

/// Registry identity as returned for a device or a module
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryIdentity {
    pub device_id: Option<String>,
    pub module_id: Option<String>,
    pub connection_state: String,
}

/// Connectivity of a device or module as seen by the hub
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
    Other(String),
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    pub fn as_str(&self) -> &str {
        match self {
            ConnectionState::Connected => CONNECTED,
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Other(raw) => raw,
        }
    }
}

impl From<&str> for ConnectionState {
    fn from(raw: &str) -> Self {
        match raw {
            CONNECTED => ConnectionState::Connected,
            "Disconnected" => ConnectionState::Disconnected,
            other => ConnectionState::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device group as reported by the update management API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AduGroupInfo {
    pub group_id: String,
    #[serde(default)]
    pub device_count: u64,
    #[serde(default)]
    pub group_type: Option<String>,
    #[serde(default)]
    pub created_date_time: Option<String>,
    #[serde(default)]
    pub deployments: Vec<String>,
}

/// Twin patch body that sets the group tag
#[derive(Debug, Clone, Serialize)]
pub(crate) struct GroupTagPatch<'a> {
    pub tags: GroupTag<'a>,
}

/// Serializes as `{"ADUGroup": <group>}`
#[derive(Debug, Clone)]
pub(crate) struct GroupTag<'a> {
    pub adu_group: &'a str,
}

impl Serialize for GroupTag<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(GROUP_TAG, self.adu_group)?;
        map.end()
    }
}

impl<'a> GroupTagPatch<'a> {
    pub(crate) fn new(group_id: &'a str) -> Self {
        Self {
            tags: GroupTag {
                adu_group: group_id,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_parsing() {
        assert!(ConnectionState::from("Connected").is_connected());
        assert_eq!(ConnectionState::from("Disconnected"), ConnectionState::Disconnected);
        // Case matters: the hub reports exactly "Connected"
        assert_eq!(
            ConnectionState::from("connected"),
            ConnectionState::Other("connected".to_string())
        );
        assert_eq!(ConnectionState::Other("Unknown".into()).to_string(), "Unknown");
    }

    #[test]
    fn test_group_info_deserialization() {
        let json = r#"{
            "groupId": "g1",
            "groupType": "IoTHubTag",
            "createdDateTime": "2024-01-01T00:00:00Z",
            "deviceCount": 1,
            "subgroupsWithNewUpdatesAvailableCount": 0,
            "deployments": []
        }"#;

        let info: AduGroupInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.group_id, "g1");
        assert_eq!(info.device_count, 1);
        assert_eq!(info.group_type.as_deref(), Some("IoTHubTag"));
    }

    #[test]
    fn test_group_info_minimal() {
        let info: AduGroupInfo = serde_json::from_str(r#"{"groupId": "g2"}"#).unwrap();
        assert_eq!(info.device_count, 0);
        assert!(info.deployments.is_empty());
    }

    #[test]
    fn test_group_tag_patch_serialization() {
        let body = serde_json::to_value(GroupTagPatch::new("g1")).unwrap();
        assert_eq!(body, serde_json::json!({ "tags": { "ADUGroup": "g1" } }));
        assert!(body["tags"].get(GROUP_TAG).is_some());
    }

    #[test]
    fn test_registry_identity() {
        let json = r#"{
            "deviceId": "dev-1",
            "moduleId": "IoTHubDeviceUpdate",
            "connectionState": "Connected",
            "etag": "x"
        }"#;
        let identity: RegistryIdentity = serde_json::from_str(json).unwrap();
        assert_eq!(identity.module_id.as_deref(), Some(DEVICE_UPDATE_MODULE_ID));
        assert_eq!(identity.connection_state, CONNECTED);
    }
}
