use anyhow::{Context, Result};
use std::env;

/// Runtime configuration for the group file service
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Maximum upload size in bytes (default: 256 MB)
    pub max_file_size: usize,

    /// JWT Secret Key
    pub jwt_secret: String,

    /// Token lifetime in hours (default: 24)
    pub jwt_expiry_hours: i64,

    /// Entries returned by the activity feed when no limit is given (default: 20)
    pub default_activity_limit: u64,

    /// Allowed CORS Origins (comma separated)
    pub allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_file_size: 256 * 1024 * 1024, // 256 MB
            jwt_secret: "secret".to_string(),
            jwt_expiry_hours: 24,
            default_activity_limit: 20,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(), // Vite default
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            // Fallback for dev convenience, strictly enforced in `production`
            jwt_secret: env::var("JWT_SECRET").unwrap_or(default.jwt_secret),

            jwt_expiry_hours: env::var("JWT_EXPIRY_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|h: &i64| *h > 0)
                .unwrap_or(default.jwt_expiry_hours),

            default_activity_limit: env::var("ACTIVITY_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.default_activity_limit),

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(default.allowed_origins),
        }
    }

    /// Relaxed limits for local work
    pub fn development() -> Self {
        Self {
            max_file_size: 1024 * 1024 * 1024,
            ..Self::default()
        }
    }

    /// Same as `from_env` but refuses to start without a real JWT secret
    pub fn production() -> Result<Self> {
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set in production")?;
        Ok(Self {
            jwt_secret,
            ..Self::from_env()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.max_file_size, 256 * 1024 * 1024);
        assert_eq!(config.jwt_expiry_hours, 24);
        assert_eq!(config.default_activity_limit, 20);
    }

    #[test]
    fn test_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.max_file_size, 1024 * 1024 * 1024);
        assert_eq!(config.jwt_secret, "secret");
    }

    #[test]
    fn test_production_config() {
        unsafe { env::set_var("JWT_SECRET", "test_secret") };
        let config = AppConfig::production().unwrap();
        unsafe { env::remove_var("JWT_SECRET") };
        assert_eq!(config.jwt_secret, "test_secret");
        assert!(AppConfig::production().is_err());
    }

    #[test]
    fn test_from_env_cors_fallback() {
        unsafe { env::remove_var("ALLOWED_ORIGINS") };
        let config = AppConfig::from_env();
        let default_config = AppConfig::default();
        assert_eq!(config.allowed_origins, default_config.allowed_origins);
        assert!(!config.allowed_origins.contains(&"*".to_string()));
    }
}
