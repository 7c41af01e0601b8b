use serde::{Deserialize, Serialize};

/// echoline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EchoConfig {
    /// Global configuration
    #[serde(default)]
    pub global: GlobalConfig,
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Global configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Default log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Server configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Connections served before the server exits, 0 for no limit
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_sessions() -> usize {
    1
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = EchoConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: EchoConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(deserialized.global.log_level, "info");
        assert_eq!(deserialized.server.max_sessions, 1);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EchoConfig = toml::from_str("[server]\nmax_sessions = 4\n").unwrap();

        assert_eq!(config.server.max_sessions, 4);
        assert_eq!(config.global.log_level, "info");
    }

    #[test]
    fn test_empty_config() {
        let config: EchoConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.max_sessions, 1);
    }
}
