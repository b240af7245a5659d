use coagent_core::checks::EnvironmentSnapshot;
use thiserror::Error;

pub const TARGET_FUNCTION_NAME_VAR: &str = "TARGET_FUNCTION_NAME";
pub const BEDROCK_MODEL_ID_VAR: &str = "BEDROCK_MODEL_ID";
pub const CORS_ALLOW_ORIGIN_VAR: &str = "CORS_ALLOW_ORIGIN";

pub const DEFAULT_BEDROCK_MODEL_ID: &str = "anthropic.claude-3-5-sonnet-20241022-v2:0";
pub const DEFAULT_CORS_ALLOW_ORIGIN: &str = "*";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),
}

pub fn process_environment() -> EnvironmentSnapshot {
    EnvironmentSnapshot::from_pairs(std::env::vars())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostTrafficConfig {
    pub target_function_name: String,
}

impl PostTrafficConfig {
    pub fn from_env(env: &EnvironmentSnapshot) -> Result<Self, ConfigError> {
        let target_function_name = env
            .get(TARGET_FUNCTION_NAME_VAR)
            .ok_or(ConfigError::Missing(TARGET_FUNCTION_NAME_VAR))?
            .to_string();
        Ok(Self {
            target_function_name,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiProxyConfig {
    pub model_id: String,
    pub cors_allow_origin: String,
}

impl Default for AiProxyConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_BEDROCK_MODEL_ID.to_string(),
            cors_allow_origin: DEFAULT_CORS_ALLOW_ORIGIN.to_string(),
        }
    }
}

impl AiProxyConfig {
    pub fn from_env(env: &EnvironmentSnapshot) -> Self {
        let defaults = Self::default();
        Self {
            model_id: env
                .get(BEDROCK_MODEL_ID_VAR)
                .map(str::to_string)
                .unwrap_or(defaults.model_id),
            cors_allow_origin: env
                .get(CORS_ALLOW_ORIGIN_VAR)
                .map(str::to_string)
                .unwrap_or(defaults.cors_allow_origin),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_traffic_config_requires_target_function() {
        let error = PostTrafficConfig::from_env(&EnvironmentSnapshot::default())
            .expect_err("target function is required");
        assert_eq!(error.to_string(), "TARGET_FUNCTION_NAME must be configured");

        let env = EnvironmentSnapshot::from_pairs([("TARGET_FUNCTION_NAME", "coagent-web")]);
        let config = PostTrafficConfig::from_env(&env).expect("config should load");
        assert_eq!(config.target_function_name, "coagent-web");
    }

    #[test]
    fn ai_proxy_config_falls_back_to_defaults() {
        let config = AiProxyConfig::from_env(&EnvironmentSnapshot::from_pairs([(
            "CORS_ALLOW_ORIGIN",
            "https://app.example.com",
        )]));
        assert_eq!(config.model_id, DEFAULT_BEDROCK_MODEL_ID);
        assert_eq!(config.cors_allow_origin, "https://app.example.com");
    }
}
