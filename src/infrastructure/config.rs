use crate::domain::{
    config::EchoConfig,
    error::{EchoError, EchoResult},
};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = ".echoline";
const CONFIG_FILE: &str = "config.toml";

/// Configuration manager
pub struct ConfigManager {
    global_config_path: PathBuf,
    project_config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create new configuration manager
    pub fn new() -> EchoResult<Self> {
        let global_config_path = Self::get_global_config_path()?;
        let project_config_path = Self::find_project_config_path();

        Ok(Self {
            global_config_path,
            project_config_path,
        })
    }

    /// Load configuration from files.
    ///
    /// The global file supplies `[global]`, the project file `[server]`.
    pub fn load_config(&self) -> EchoResult<EchoConfig> {
        let mut config = EchoConfig::default();

        if self.global_config_path.exists() {
            let global_config = self.load_config_from_path(&self.global_config_path)?;
            config.global = global_config.global;
        }

        if let Some(project_path) = &self.project_config_path {
            if project_path.exists() {
                let project_config = self.load_config_from_path(project_path)?;
                config.server = project_config.server;
            }
        }

        Ok(config)
    }

    fn get_global_config_path() -> EchoResult<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| EchoError::Config {
            message: "Could not determine home directory".to_string(),
        })?;

        Ok(home.join(".config").join("echoline").join(CONFIG_FILE))
    }

    /// Find project configuration path by walking up directory tree
    fn find_project_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        Self::find_project_config_from(&current_dir)
    }

    fn find_project_config_from(start: &Path) -> Option<PathBuf> {
        let mut path = start;

        loop {
            let config_path = path.join(CONFIG_DIR).join(CONFIG_FILE);
            if config_path.exists() {
                return Some(config_path);
            }

            path = path.parent()?;
        }
    }

    /// Load configuration from specific path
    pub fn load_config_from_path(&self, path: &Path) -> EchoResult<EchoConfig> {
        let content = fs::read_to_string(path).map_err(|e| EchoError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        toml::from_str(&content).map_err(|e| EchoError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })
    }

    /// Save configuration to specific path
    pub fn save_config_to_path(&self, path: &Path, config: &EchoConfig) -> EchoResult<()> {
        let content = toml::to_string_pretty(config).map_err(|e| EchoError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| EchoError::Config {
                message: format!("Failed to create config directory: {}", e),
            })?;
        }

        fs::write(path, content).map_err(|e| EchoError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })
    }

    /// Create default project configuration under `path/.echoline`
    pub fn init_project_config(&self, path: &Path) -> EchoResult<PathBuf> {
        let config_file = path.join(CONFIG_DIR).join(CONFIG_FILE);
        self.init_config_file(&config_file, EchoConfig::default())?;
        Ok(config_file)
    }

    /// Create default global configuration
    pub fn init_global_config(&self) -> EchoResult<PathBuf> {
        let path = self.global_config_path.clone();
        self.init_config_file(&path, EchoConfig::default())?;
        Ok(path)
    }

    fn init_config_file(&self, path: &Path, config: EchoConfig) -> EchoResult<()> {
        if path.exists() {
            return Err(EchoError::Config {
                message: format!("Configuration already exists at {}", path.display()),
            });
        }

        self.save_config_to_path(path, &config)
    }

    /// Get the current project config path (if any)
    pub fn get_project_config_path(&self) -> Option<&PathBuf> {
        self.project_config_path.as_ref()
    }

    /// Get the global config path
    pub fn get_global_config_path_ref(&self) -> &PathBuf {
        &self.global_config_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_manager_creation() {
        let manager = ConfigManager::new().unwrap();
        assert!(manager
            .get_global_config_path_ref()
            .ends_with("echoline/config.toml"));
    }

    #[test]
    fn test_init_project_config() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::new().unwrap();

        let path = manager.init_project_config(temp_dir.path()).unwrap();
        assert_eq!(path, temp_dir.path().join(".echoline").join("config.toml"));

        let config = manager.load_config_from_path(&path).unwrap();
        assert_eq!(config.server.max_sessions, 1);
        assert_eq!(config.global.log_level, "info");

        // Refuses to overwrite
        assert!(manager.init_project_config(temp_dir.path()).is_err());
    }

    #[test]
    fn test_find_project_config_walks_up() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::new().unwrap();
        manager.init_project_config(temp_dir.path()).unwrap();

        let nested = temp_dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let found = ConfigManager::find_project_config_from(&nested).unwrap();
        assert_eq!(found, temp_dir.path().join(".echoline").join("config.toml"));
    }

    #[test]
    fn test_load_invalid_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.toml");
        fs::write(&path, "[server]\nmax_sessions = \"many\"\n").unwrap();

        let manager = ConfigManager::new().unwrap();
        let result = manager.load_config_from_path(&path);

        assert!(matches!(result, Err(EchoError::Config { .. })));
    }

    #[test]
    fn test_load_custom_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.toml");
        fs::write(&path, "[global]\nlog_level = \"debug\"\n\n[server]\nmax_sessions = 0\n").unwrap();

        let manager = ConfigManager::new().unwrap();
        let config = manager.load_config_from_path(&path).unwrap();

        assert_eq!(config.global.log_level, "debug");
        assert_eq!(config.server.max_sessions, 0);
    }
}
