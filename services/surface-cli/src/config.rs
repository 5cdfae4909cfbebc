//! Configuration loading for CLI runs.
//!
//! The base configuration comes from `SURFACE_*` environment variables. A
//! YAML file, when given, replaces it; command-line flags override both.

use std::path::Path;

use anyhow::{Context, Result};
use surface::SurfaceConfig;
use tracing::{debug, info};

/// Settings taken from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub resolution: Option<usize>,
    pub utm_zone: Option<u8>,
    pub max_fallback_distance_m: Option<f64>,
}

/// Load a surface configuration from a YAML file.
///
/// Keys missing from the file keep their defaults.
pub fn load_yaml(path: &Path) -> Result<SurfaceConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: SurfaceConfig = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    info!(path = %path.display(), "Loaded surface config");
    Ok(config)
}

/// Resolve the effective configuration and validate it.
pub fn resolve(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<SurfaceConfig> {
    let mut config = match path {
        Some(path) => load_yaml(path)?,
        None => SurfaceConfig::from_env(),
    };

    if let Some(resolution) = overrides.resolution {
        config.resolution = resolution;
    }
    if let Some(zone) = overrides.utm_zone {
        config.utm_zone = Some(zone);
    }
    if let Some(distance) = overrides.max_fallback_distance_m {
        config.max_fallback_distance_m = Some(distance);
    }

    config.validate().context("Invalid surface configuration")?;
    debug!(?config, "Resolved configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use surface::VariogramModel;

    fn yaml_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_yaml() {
        let file = yaml_file(
            r#"
resolution: 120
value_ceiling: 500
variogram_models: [spherical]
utm_zone: 44
cache_ttl_secs: 60
"#,
        );

        let config = load_yaml(file.path()).unwrap();
        assert_eq!(config.resolution, 120);
        assert_eq!(config.value_ceiling, 500.0);
        assert_eq!(config.variogram_models, vec![VariogramModel::Spherical]);
        assert_eq!(config.utm_zone, Some(44));
        assert_eq!(config.cache_ttl_secs, 60);
        // Untouched keys keep defaults
        assert_eq!(config.value_floor, 0.0);
        assert_eq!(config.variogram_lags, 6);
    }

    #[test]
    fn test_flags_override_file() {
        let file = yaml_file("resolution: 120\nutm_zone: 44\n");
        let overrides = ConfigOverrides {
            resolution: Some(40),
            utm_zone: None,
            max_fallback_distance_m: Some(15_000.0),
        };

        let config = resolve(Some(file.path()), &overrides).unwrap();
        assert_eq!(config.resolution, 40);
        assert_eq!(config.utm_zone, Some(44));
        assert_eq!(config.max_fallback_distance_m, Some(15_000.0));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let file = yaml_file("resolution: 1\n");
        assert!(resolve(Some(file.path()), &ConfigOverrides::default()).is_err());

        let file = yaml_file("resolution: 50\n");
        let overrides = ConfigOverrides {
            utm_zone: Some(61),
            ..ConfigOverrides::default()
        };
        assert!(resolve(Some(file.path()), &overrides).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = load_yaml(Path::new("/nonexistent/surface.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_malformed_yaml() {
        let file = yaml_file("resolution: [not, a, number]\n");
        let err = load_yaml(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
