// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use path_clean::clean;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "privagator.config.yaml";

/// Strategy used to look for a config file above a directory.
pub type FindInParent = fn(&Path, &str) -> Option<PathBuf>;

/// Where a config path came from. Only an explicit path is required to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit(PathBuf),
    Discovered(PathBuf),
    Default(PathBuf),
}

impl ConfigSource {
    pub fn path(&self) -> &Path {
        match self {
            ConfigSource::Explicit(p) | ConfigSource::Discovered(p) | ConfigSource::Default(p) => p,
        }
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, ConfigSource::Explicit(_))
    }
}

pub fn find_in_parent(start: &Path, filename: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(filename))
        .find(|candidate| candidate.is_file())
}

/// Resolve the config file location.
///
/// Precedence: the path given on the command line (relative paths are taken
/// from `cwd`), then the first `filename` found walking up from `cwd`, then
/// `filename` inside `default_dir`.
pub fn resolve_config_path(
    find: FindInParent,
    cwd: impl Into<PathBuf>,
    default_dir: impl Into<PathBuf>,
    filename: &str,
    cli_file: Option<PathBuf>,
) -> ConfigSource {
    let cwd = cwd.into();

    if let Some(cli_file) = cli_file {
        if cli_file.is_absolute() {
            return ConfigSource::Explicit(cli_file);
        }
        return ConfigSource::Explicit(clean(cwd.join(cli_file)));
    }

    if let Some(found) = find(&cwd, filename) {
        return ConfigSource::Discovered(found);
    }

    ConfigSource::Default(clean(default_dir.into().join(filename)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn not_found(_: &Path, _: &str) -> Option<PathBuf> {
        None
    }

    fn found(_: &Path, _: &str) -> Option<PathBuf> {
        Some(PathBuf::from("/srv/privagator.config.yaml"))
    }

    #[test]
    fn test_resolve_precedence() -> Result<()> {
        let source = resolve_config_path(
            not_found,
            "/srv/app",
            "/etc/privagator",
            DEFAULT_CONFIG_NAME,
            None,
        );
        assert_eq!(
            source,
            ConfigSource::Default(PathBuf::from("/etc/privagator/privagator.config.yaml"))
        );

        // cli path wins over a discovered file
        let source = resolve_config_path(
            found,
            "/srv/app",
            "/etc/privagator",
            DEFAULT_CONFIG_NAME,
            Some(PathBuf::from("/opt/conf.yaml")),
        );
        assert_eq!(source, ConfigSource::Explicit(PathBuf::from("/opt/conf.yaml")));

        let source = resolve_config_path(
            found,
            "/srv/app",
            "/etc/privagator",
            DEFAULT_CONFIG_NAME,
            Some(PathBuf::from("../conf/p.yaml")),
        );
        assert_eq!(source, ConfigSource::Explicit(PathBuf::from("/srv/conf/p.yaml")));
        assert!(source.is_explicit());

        let source = resolve_config_path(
            found,
            "/srv/app",
            "/etc/privagator",
            DEFAULT_CONFIG_NAME,
            None,
        );
        assert_eq!(
            source.path(),
            Path::new("/srv/privagator.config.yaml")
        );
        Ok(())
    }

    #[test]
    fn test_find_in_parent_walks_up() -> Result<()> {
        let root = tempfile::tempdir()?;
        let nested = root.path().join("a").join("b");
        std::fs::create_dir_all(&nested)?;
        std::fs::write(root.path().join(DEFAULT_CONFIG_NAME), "server: {}\n")?;

        let found = find_in_parent(&nested, DEFAULT_CONFIG_NAME);
        assert_eq!(found, Some(root.path().join(DEFAULT_CONFIG_NAME)));
        assert_eq!(find_in_parent(&nested, "missing.yaml"), None);
        Ok(())
    }
}
