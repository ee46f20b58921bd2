//! Application path resolution
//!
//! A `midimap.yaml` in the working directory wins; otherwise the config
//! lives in the platform config directory (`~/.config/midimap` on Linux,
//! `%APPDATA%\midimap` on Windows). Logs go to the platform data directory.

use std::path::{Path, PathBuf};

/// Directory name used under the platform directories
const APP_DIR: &str = "midimap";

pub const CONFIG_FILE: &str = "midimap.yaml";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config: PathBuf,
    pub logs_dir: PathBuf,
}

impl AppPaths {
    /// Resolve paths, honouring an explicit config path when given
    pub fn detect(explicit_config: Option<&Path>) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::resolve(explicit_config, &cwd, dirs::config_dir(), dirs::data_local_dir())
    }

    fn resolve(
        explicit_config: Option<&Path>,
        cwd: &Path,
        config_dir: Option<PathBuf>,
        data_dir: Option<PathBuf>,
    ) -> Self {
        let config = match explicit_config {
            Some(path) => path.to_path_buf(),
            None => {
                let local = cwd.join(CONFIG_FILE);
                match config_dir {
                    Some(dir) if !local.exists() => dir.join(APP_DIR).join(CONFIG_FILE),
                    _ => local,
                }
            }
        };

        let logs_dir = data_dir
            .map(|dir| dir.join(APP_DIR).join("logs"))
            .unwrap_or_else(|| cwd.join("logs"));

        Self { config, logs_dir }
    }
}
