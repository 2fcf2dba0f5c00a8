//! Configuration system

pub use serde::{Serialize, Deserialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Scene construction settings
///
/// Missing fields fall back to [`SceneConfig::default`], so a config file
/// only needs to name the values it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Scene name, used in log output
    pub name: String,

    /// Create an entity processor list for this scene
    ///
    /// Scenes without systems skip every processor notification.
    pub enable_entity_systems: bool,

    /// Initial capacity of the entity storage and live list
    pub entity_capacity: usize,

    /// Initial capacity of the scene-wide renderable list
    pub renderable_capacity: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            name: "scene".to_string(),
            enable_entity_systems: true,
            entity_capacity: 64,
            renderable_capacity: 64,
        }
    }
}

impl SceneConfig {
    /// Create a configuration with the given scene name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Enable or disable entity systems
    pub fn with_entity_systems(mut self, enabled: bool) -> Self {
        self.enable_entity_systems = enabled;
        self
    }

    /// Set the initial entity capacity
    pub fn with_entity_capacity(mut self, capacity: usize) -> Self {
        self.entity_capacity = capacity;
        self
    }
}

impl Config for SceneConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_config_partial_toml() {
        let config: SceneConfig = toml::from_str(
            r#"
            name = "level_1"
            enable_entity_systems = false
            "#,
        )
        .unwrap();

        assert_eq!(config.name, "level_1");
        assert!(!config.enable_entity_systems);
        assert_eq!(config.entity_capacity, SceneConfig::default().entity_capacity);
    }

    #[test]
    fn test_scene_config_ron() {
        let config: SceneConfig =
            ron::from_str(r#"(name: "menu", entity_capacity: 8)"#).unwrap();

        assert_eq!(config.name, "menu");
        assert_eq!(config.entity_capacity, 8);
        assert!(config.enable_entity_systems);
    }

    #[test]
    fn test_unsupported_format() {
        let result = SceneConfig::load_from_file("scene.yaml");
        assert!(matches!(result, Err(ConfigError::Io(_)) | Err(ConfigError::UnsupportedFormat(_))));

        let saved = SceneConfig::default().save_to_file("scene.yaml");
        assert!(matches!(saved, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_save_and_load_toml() {
        let path = std::env::temp_dir().join(format!("scene_core_config_{}.toml", std::process::id()));
        let path = path.to_string_lossy().to_string();

        let config = SceneConfig::new("saved").with_entity_capacity(12);
        config.save_to_file(&path).unwrap();
        let loaded = SceneConfig::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }
}
