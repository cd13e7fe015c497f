use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::ServicemapConfig;
use crate::errors::{Error, Result};

/// File name searched for by [`discover_config`]
pub const CONFIG_FILE_NAME: &str = ".servicemap.toml";

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Parse and validate configuration from a TOML string
pub fn parse_config(contents: &str) -> Result<ServicemapConfig> {
    let config = toml::from_str::<ServicemapConfig>(contents)?;
    config.detection.validate()?;
    Ok(config)
}

/// Load configuration from an explicit path. Any failure is an error.
pub fn load_config(path: &Path) -> Result<ServicemapConfig> {
    let contents = fs::read_to_string(path).map_err(|source| Error::ConfigFile {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&contents)?;
    debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Try loading config from a specific path, logging instead of failing
pub(crate) fn try_load_config_from_path(config_path: &Path) -> Option<ServicemapConfig> {
    let contents = match fs::read_to_string(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            handle_read_error(config_path, &e);
            return None;
        }
    };

    match parse_config(&contents) {
        Ok(config) => {
            debug!("Loaded config from {}", config_path.display());
            Some(config)
        }
        Err(e) => {
            warn!("Ignoring {}: {}. Using defaults.", config_path.display(), e);
            None
        }
    }
}

/// Only log actual errors, not "file not found"
fn handle_read_error(config_path: &Path, error: &std::io::Error) {
    if error.kind() != std::io::ErrorKind::NotFound {
        warn!(
            "Failed to read config file {}: {}",
            config_path.display(),
            error
        );
    }
}

/// `start` and its ancestors, nearest first, at most `max_depth` entries
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Search `start` and its ancestors for [`CONFIG_FILE_NAME`], falling back
/// to defaults when none is found or the one found is unusable
pub fn discover_config(start: &Path) -> ServicemapConfig {
    directory_ancestors(start.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| try_load_config_from_path(&path))
        .unwrap_or_else(|| {
            debug!(
                "No config found after checking {} directories. Using default config.",
                MAX_TRAVERSAL_DEPTH
            );
            ServicemapConfig::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Granularity;
    use indoc::indoc;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(indoc! {r#"
            [detection]
            max_iterations = 7
            max_levels = 3
            refine = false
            granularity = "class"
        "#})
        .unwrap();

        assert_eq!(config.detection.max_iterations, 7);
        assert_eq!(config.detection.max_levels, 3);
        assert!(!config.detection.refine);
        assert_eq!(config.detection.granularity, Granularity::Class);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config = parse_config("[detection]\nmax_levels = 4\n").unwrap();
        assert_eq!(config.detection.max_levels, 4);
        assert_eq!(config.detection.max_iterations, 100);
        assert!(config.detection.refine);

        assert_eq!(parse_config("").unwrap(), ServicemapConfig::default());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(parse_config("[detection]\nmax_iterations = 0\n").is_err());
        assert!(parse_config("[detection]\ngranularity = \"module\"\n").is_err());
    }

    #[test]
    fn test_load_config_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_config(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, Error::ConfigFile { .. }));
    }

    #[test]
    fn test_discover_config_walks_up_from_nested_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[detection]\nmax_levels = 5\n",
        )
        .unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let config = discover_config(&nested);
        assert_eq!(config.detection.max_levels, 5);
    }

    #[test]
    fn test_discover_config_ignores_broken_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "[detection\n").unwrap();

        // A broken file is skipped; the walk may still find another config
        // further up, so only check that discovery does not fail.
        let config = discover_config(dir.path());
        assert!(config.detection.validate().is_ok());
    }

    #[test]
    fn test_directory_ancestors_respects_depth() {
        let ancestors: Vec<_> = directory_ancestors(PathBuf::from("/a/b/c"), 2).collect();
        assert_eq!(ancestors, vec![PathBuf::from("/a/b/c"), PathBuf::from("/a/b")]);
    }
}
