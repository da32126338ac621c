use std::env;
use std::path::{Path, PathBuf};

use autosre_domain::{DEFAULT_CONFIG_FILE, SimulatorConfig};

const STATE_DIR: &str = ".autosre";
const SNAPSHOT_FILE: &str = "snapshot.json";

pub fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME").map(PathBuf::from)
}

/// Explicit path (flag or `AUTOSRE_CONFIG_PATH`), else `$HOME/.autosre/config.yaml`,
/// else `autosre-config.yaml` in the working directory.
pub fn config_path(explicit: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    if let Some(home) = home {
        return Path::new(&home).join(STATE_DIR).join("config.yaml");
    }
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

pub fn snapshot_path(
    explicit: Option<PathBuf>,
    config: &SimulatorConfig,
    home: Option<PathBuf>,
) -> PathBuf {
    if let Some(path) = explicit.or_else(|| config.snapshot_path.clone()) {
        return path;
    }
    if let Some(home) = home {
        return home.join(STATE_DIR).join(SNAPSHOT_FILE);
    }
    PathBuf::from("autosre-snapshot.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_prefers_explicit_then_home() {
        let explicit = PathBuf::from("/etc/autosre.yaml");
        assert_eq!(
            config_path(Some(explicit.clone()), Some("/home/op".into())),
            explicit
        );
        assert_eq!(
            config_path(None, Some("/home/op".into())),
            PathBuf::from("/home/op/.autosre/config.yaml")
        );
        assert_eq!(config_path(None, None), PathBuf::from(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn snapshot_path_falls_back_through_config() {
        let mut config = SimulatorConfig::default();
        assert_eq!(
            snapshot_path(None, &config, Some("/home/op".into())),
            PathBuf::from("/home/op/.autosre/snapshot.json")
        );
        config.snapshot_path = Some("/var/lib/autosre/state.json".into());
        assert_eq!(
            snapshot_path(None, &config, Some("/home/op".into())),
            PathBuf::from("/var/lib/autosre/state.json")
        );
        assert_eq!(
            snapshot_path(Some("local.json".into()), &config, None),
            PathBuf::from("local.json")
        );
    }
}
