//! Kubernetes object fragments injected into admitted pods
//!
//! These are minimal serde models of the core/v1 types the injector writes.
//! Only the fields the injector sets are modelled; everything serializes to
//! the same JSON the API server expects for the full types.

use serde::{Deserialize, Serialize};

use crate::{
    AGENT_IMAGE, AGENT_INIT_CONTAINER_NAME, AGENT_JAR_PATH, AGENT_MOUNT_PATH, AGENT_VOLUME_NAME,
    SECRET_TOKEN_ENV, SECRET_TOKEN_SECRET_KEY, SECRET_TOKEN_SECRET_NAME,
};

// =============================================================================
// Volumes
// =============================================================================

/// Pod volume
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    /// Volume name
    pub name: String,
    /// EmptyDir source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_dir: Option<EmptyDirVolumeSource>,
}

/// EmptyDir volume source (always serialized as `{}`)
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct EmptyDirVolumeSource {}

/// Container volume mount
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMount {
    /// Name of the volume to mount
    pub name: String,
    /// Path inside the container
    pub mount_path: String,
}

// =============================================================================
// Containers
// =============================================================================

/// Container spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    /// Container name
    pub name: String,
    /// Image
    pub image: String,
    /// Command
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    /// Volume mounts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
}

/// Environment variable
///
/// Exactly one of `value` and `value_from` is set.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnvVar {
    /// Variable name
    pub name: String,
    /// Literal value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Value resolved by the kubelet at container start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_from: Option<EnvVarSource>,
}

impl EnvVar {
    /// Literal name/value variable
    pub fn literal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            value_from: None,
        }
    }

    /// Variable read from a key of a Secret in the pod's namespace
    pub fn from_secret(
        name: impl Into<String>,
        secret: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: None,
            value_from: Some(EnvVarSource {
                secret_key_ref: SecretKeySelector {
                    name: secret.into(),
                    key: key.into(),
                },
            }),
        }
    }
}

/// Source for an environment variable's value
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnvVarSource {
    /// Secret key reference
    pub secret_key_ref: SecretKeySelector,
}

/// Selects a key of a Secret
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SecretKeySelector {
    /// Secret name
    pub name: String,
    /// Key within the secret
    pub key: String,
}

// =============================================================================
// Agent Fragments
// =============================================================================

/// The shared volume the agent jar is copied into
pub fn agent_volume() -> Volume {
    Volume {
        name: AGENT_VOLUME_NAME.to_string(),
        empty_dir: Some(EmptyDirVolumeSource {}),
    }
}

/// Mount of the agent volume at [`AGENT_MOUNT_PATH`]
pub fn agent_volume_mount() -> VolumeMount {
    VolumeMount {
        name: AGENT_VOLUME_NAME.to_string(),
        mount_path: AGENT_MOUNT_PATH.to_string(),
    }
}

/// Init container that copies the agent jar out of the agent image
pub fn agent_init_container() -> Container {
    Container {
        name: AGENT_INIT_CONTAINER_NAME.to_string(),
        image: AGENT_IMAGE.to_string(),
        command: vec![
            "cp".to_string(),
            "-v".to_string(),
            AGENT_JAR_PATH.to_string(),
            AGENT_MOUNT_PATH.to_string(),
        ],
        volume_mounts: vec![agent_volume_mount()],
    }
}

/// The secret token variable, resolved from the APM server token secret
pub fn secret_token_env() -> EnvVar {
    EnvVar::from_secret(
        SECRET_TOKEN_ENV,
        SECRET_TOKEN_SECRET_NAME,
        SECRET_TOKEN_SECRET_KEY,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn agent_volume_is_empty_dir() {
        let value = serde_json::to_value(agent_volume()).unwrap();
        assert_eq!(value, json!({"name": "elastic-apm-agent", "emptyDir": {}}));
    }

    #[test]
    fn agent_volume_mount_serializes_camel_case() {
        let value = serde_json::to_value(agent_volume_mount()).unwrap();
        assert_eq!(
            value,
            json!({"name": "elastic-apm-agent", "mountPath": "/elastic/apm/agent"})
        );
    }

    #[test]
    fn init_container_copies_jar_into_mount() {
        let container = agent_init_container();
        assert_eq!(container.name, "elastic-java-agent");
        assert_eq!(
            container.image,
            "docker.elastic.co/observability/apm-agent-java:1.23.0"
        );
        assert_eq!(
            container.command,
            vec![
                "cp",
                "-v",
                "/usr/agent/elastic-apm-agent.jar",
                "/elastic/apm/agent"
            ]
        );
        assert_eq!(container.volume_mounts, vec![agent_volume_mount()]);
    }

    #[test]
    fn secret_token_has_no_literal_value() {
        let value = serde_json::to_value(secret_token_env()).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "ELASTIC_APM_SECRET_TOKEN",
                "valueFrom": {
                    "secretKeyRef": {"name": "apm-server-apm-token", "key": "secret-token"}
                }
            })
        );
    }

    #[test]
    fn literal_env_omits_value_from() {
        let value = serde_json::to_value(EnvVar::literal("LOG_LEVEL", "debug")).unwrap();
        assert_eq!(value, json!({"name": "LOG_LEVEL", "value": "debug"}));
    }
}
