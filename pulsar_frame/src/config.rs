//! Framework configuration

/// Configuration consumed by backend bootstrap (instance and device creation)
#[derive(Debug, Clone)]
pub struct FrameworkConfig {
    /// Application name reported to the graphics driver
    pub app_name: String,

    /// Application version packed as (major, minor, patch)
    pub app_version: (u32, u32, u32),

    /// Enable the backend's validation layer and debug messenger.
    /// Only honored when the backend was compiled with validation support.
    pub enable_validation: bool,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            app_name: "Pulsar Application".to_string(),
            app_version: (0, 1, 0),
            enable_validation: cfg!(debug_assertions),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FrameworkConfig::default();
        assert_eq!(config.app_name, "Pulsar Application");
        assert_eq!(config.app_version, (0, 1, 0));
    }

    #[test]
    fn test_config_clone() {
        let config = FrameworkConfig {
            app_name: "Demo".to_string(),
            app_version: (1, 2, 3),
            enable_validation: true,
        };
        let cloned = config.clone();
        assert_eq!(cloned.app_name, "Demo");
        assert_eq!(cloned.app_version, (1, 2, 3));
        assert!(cloned.enable_validation);
    }
}
