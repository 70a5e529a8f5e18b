//! JSON patch generation for agent injection
//!
//! JSON patch `add` behaves differently for a missing array and an existing
//! one: a missing field must be created whole (`/spec/volumes` with `[v]`),
//! while an existing array is extended with the end-of-array token
//! (`/spec/volumes/-` with `v`). Appending to a missing field fails, and
//! creating over an existing field replaces it. Every builder here therefore
//! takes whether its target field is present on the admitted pod.
//!
//! Presence means the field exists in the request, even as an empty array.

mod env;

pub use env::build_environment;

use json_patch::{AddOperation, PatchOperation};
use jsonptr::PointerBuf;
use k8s_openapi::api::core::v1::PodSpec;
use serde::Serialize;
use tracing::debug;

use crate::agent::{agent_init_container, agent_volume, agent_volume_mount, EnvVar};
use crate::AgentConfig;

/// JSON pointer token that addresses the end of an array
const APPEND_TOKEN: &str = "-";

/// Build the full patch injecting the agent into a pod
///
/// Operations are emitted in a fixed order: the volume, the init container,
/// then for each application container its volume mount followed by its
/// environment variables.
///
/// The patch is not idempotent. Applying it to a pod that already carries the
/// agent adds a second volume, init container, mount and set of variables.
pub fn create_patch(config: &AgentConfig, spec: &PodSpec) -> Vec<PatchOperation> {
    let env = build_environment(config);

    let mut ops = vec![
        volume_patch(spec.volumes.is_some()),
        init_container_patch(spec.init_containers.is_some()),
    ];

    for (index, container) in spec.containers.iter().enumerate() {
        ops.push(volume_mount_patch(container.volume_mounts.is_some(), index));
        ops.extend(env_patches(&env, container.env.is_some(), index));
    }

    debug!(
        containers = spec.containers.len(),
        env_vars = env.len(),
        patch_ops = ops.len(),
        "Generated agent patch"
    );

    ops
}

/// Patch adding the agent volume to `/spec/volumes`
pub fn volume_patch(has_volumes: bool) -> PatchOperation {
    add_field(
        PointerBuf::from_tokens(["spec", "volumes"]),
        has_volumes,
        &agent_volume(),
    )
}

/// Patch adding the agent init container to `/spec/initContainers`
pub fn init_container_patch(has_init_containers: bool) -> PatchOperation {
    add_field(
        PointerBuf::from_tokens(["spec", "initContainers"]),
        has_init_containers,
        &agent_init_container(),
    )
}

/// Patch mounting the agent volume into the container at `index`
pub fn volume_mount_patch(has_volume_mounts: bool, index: usize) -> PatchOperation {
    add_field(
        container_field(index, "volumeMounts"),
        has_volume_mounts,
        &agent_volume_mount(),
    )
}

/// Patches adding `env` to the container at `index`
///
/// A missing `env` is created in a single operation holding every variable.
/// An existing `env` gets one append operation per variable, in order.
pub fn env_patches(env: &[EnvVar], has_env: bool, index: usize) -> Vec<PatchOperation> {
    let mut path = container_field(index, "env");
    if !has_env {
        return vec![add(path, to_value(&env))];
    }

    path.push_back(APPEND_TOKEN);
    env.iter().map(|var| add(path.clone(), to_value(var))).collect()
}

/// Create the array at `path` holding `value`, or append `value` if it exists
fn add_field<T: Serialize>(mut path: PointerBuf, exists: bool, value: &T) -> PatchOperation {
    if !exists {
        return add(path, to_value(&[value]));
    }
    path.push_back(APPEND_TOKEN);
    add(path, to_value(value))
}

fn add(path: PointerBuf, value: serde_json::Value) -> PatchOperation {
    PatchOperation::Add(AddOperation { path, value })
}

/// `/spec/containers/{index}/{field}`
fn container_field(index: usize, field: &str) -> PointerBuf {
    let index = index.to_string();
    PointerBuf::from_tokens(["spec", "containers", index.as_str(), field])
}

// The agent types are plain structs with string keys, which always serialize.
fn to_value<T: Serialize + ?Sized>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or_default()
}
