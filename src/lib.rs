//! APM Injector - mutating admission webhook for the Elastic APM Java agent
//!
//! On pod admission the injector computes a JSON patch (RFC 6902) that:
//! - adds an `emptyDir` volume shared between an init container and the app
//! - adds an init container that copies the agent jar into that volume
//! - mounts the volume into every application container
//! - injects the APM secret token and configured environment variables
//!
//! Only `add` operations are produced. The patch is not idempotent: admitting
//! an already-injected pod injects the agent a second time.
//!
//! # Modules
//!
//! - [`agent`] - Kubernetes object fragments injected into the pod
//! - [`patch`] - Patch generation (the create-vs-append logic)
//! - [`config`] - Agent configuration loaded from YAML
//! - [`webhook`] - AdmissionReview handling over HTTP
//! - [`server`] - TLS server hosting the webhook
//! - [`telemetry`] - Tracing subscriber setup
//! - [`error`] - Error types

#![deny(missing_docs)]

pub mod agent;
pub mod config;
pub mod error;
pub mod patch;
pub mod server;
pub mod telemetry;
pub mod webhook;

pub use config::AgentConfig;
pub use error::Error;
pub use patch::create_patch;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Agent Constants
// =============================================================================

/// Name of the shared volume the agent jar is staged into
pub const AGENT_VOLUME_NAME: &str = "elastic-apm-agent";

/// Path the agent volume is mounted at, in the init container and every app container
pub const AGENT_MOUNT_PATH: &str = "/elastic/apm/agent";

/// Name of the init container that fetches the agent
pub const AGENT_INIT_CONTAINER_NAME: &str = "elastic-java-agent";

/// Agent image, pinned to a release tag
pub const AGENT_IMAGE: &str = "docker.elastic.co/observability/apm-agent-java:1.23.0";

/// Location of the agent jar inside [`AGENT_IMAGE`]
pub const AGENT_JAR_PATH: &str = "/usr/agent/elastic-apm-agent.jar";

/// Environment variable carrying the APM server secret token
pub const SECRET_TOKEN_ENV: &str = "ELASTIC_APM_SECRET_TOKEN";

/// Secret holding the APM server token
pub const SECRET_TOKEN_SECRET_NAME: &str = "apm-server-apm-token";

/// Key within [`SECRET_TOKEN_SECRET_NAME`] holding the token
pub const SECRET_TOKEN_SECRET_KEY: &str = "secret-token";
