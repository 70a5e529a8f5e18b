//! Environment variables injected into application containers

use crate::agent::{secret_token_env, EnvVar};
use crate::AgentConfig;

/// Build the variables injected into every application container
///
/// The secret token always comes first, followed by the configured variables
/// in name order.
pub fn build_environment(config: &AgentConfig) -> Vec<EnvVar> {
    let mut vars = Vec::with_capacity(config.environment.len() + 1);
    vars.push(secret_token_env());
    vars.extend(
        config
            .environment
            .iter()
            .map(|(name, value)| EnvVar::literal(name.as_str(), value.as_str())),
    );
    vars
}
