// src/infra/paths.rs — Path management
//
// All paths respect the DEVICEFIX_HOME environment variable for isolation.
// When DEVICEFIX_HOME is set, config and data live under that directory.
// When unset, config uses ~/.devicefix/ and data uses the platform data dir.

use directories::ProjectDirs;
use std::path::PathBuf;
use std::sync::OnceLock;

static PROJECT_DIRS: OnceLock<ProjectDirs> = OnceLock::new();

fn project_dirs() -> &'static ProjectDirs {
    PROJECT_DIRS.get_or_init(|| {
        ProjectDirs::from("", "", "devicefix").expect("Could not determine home directory")
    })
}

/// Returns the DEVICEFIX_HOME override, if set.
fn devicefix_home() -> Option<PathBuf> {
    std::env::var_os("DEVICEFIX_HOME").map(PathBuf::from)
}

/// Configuration directory: $DEVICEFIX_HOME/ or ~/.devicefix/
pub fn config_dir() -> PathBuf {
    if let Some(home) = devicefix_home() {
        return home;
    }
    dirs_home().join(".devicefix")
}

/// Data directory: $DEVICEFIX_HOME/data/ or the platform-local data dir
pub fn data_dir() -> PathBuf {
    if let Some(home) = devicefix_home() {
        return home.join("data");
    }
    project_dirs().data_local_dir().to_path_buf()
}

/// Home directory
pub fn dirs_home() -> PathBuf {
    directories::BaseDirs::new()
        .expect("Could not determine home directory")
        .home_dir()
        .to_path_buf()
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Database path
pub fn db_path() -> PathBuf {
    data_dir().join("devicefix.db")
}
