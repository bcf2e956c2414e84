//! Command implementations.

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};
use folio_core::Config;

pub mod build;
pub mod check;
pub mod new;
pub mod watch;

/// Site directories, resolved against the directory holding the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePaths {
    pub root: PathBuf,
    pub content: PathBuf,
    pub output: PathBuf,
    pub static_dir: PathBuf,
}

impl SitePaths {
    pub fn resolve(config_path: &Path, config: &Config) -> Self {
        let root = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        Self {
            content: root.join(&config.build.content_dir),
            output: root.join(&config.build.output_dir),
            static_dir: root.join(&config.build.static_dir),
            root,
        }
    }
}

/// Load `folio.toml`, applying `FOLIO__*` environment overrides.
pub fn load_config(config_path: &Path) -> Result<Config> {
    Config::load_with_env(config_path)
        .wrap_err_with(|| format!("Failed to load configuration from {}", config_path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_relative_to_config() {
        let config = Config::new("Test", "https://example.com");
        let paths = SitePaths::resolve(Path::new("site/folio.toml"), &config);

        assert_eq!(paths.root, PathBuf::from("site"));
        assert_eq!(paths.content, PathBuf::from("site/content"));
        assert_eq!(paths.output, PathBuf::from("site/public"));
        assert_eq!(paths.static_dir, PathBuf::from("site/static"));
    }

    #[test]
    fn test_bare_config_name_uses_cwd() {
        let config = Config::new("Test", "https://example.com");
        let paths = SitePaths::resolve(Path::new("folio.toml"), &config);
        assert_eq!(paths.content, PathBuf::from("./content"));
    }
}
