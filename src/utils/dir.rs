use std::{
    env, io,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Result};

const APPLICATION_DIR: &str = "journeytrack";
const STORE_FILE: &str = "journeys.json";
const LOG_DIR: &str = "logs";

/// Resolves and creates the directory journeys and logs are kept in. An explicit directory wins
/// over the platform default.
pub fn application_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    let path = match explicit {
        Some(path) => path,
        None => default_application_path()?,
    };

    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}

/// `$XDG_STATE_HOME/journeytrack`, falling back to `$HOME/.local/state/journeytrack`. On Windows
/// `%APPDATA%\journeytrack`.
fn default_application_path() -> Result<PathBuf> {
    #[cfg(windows)]
    let mut path = env::var("APPDATA")
        .map(PathBuf::from)
        .map_err(|_| anyhow!("APPDATA should be present on Windows"))?;

    #[cfg(not(windows))]
    let mut path = env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|_| {
            env::var("HOME").map(|home| {
                let mut path = PathBuf::from(home);
                path.push(".local/state");
                path
            })
        })
        .map_err(|_| anyhow!("Couldn't find neither XDG_STATE_HOME nor HOME"))?;

    path.push(APPLICATION_DIR);
    Ok(path)
}

pub fn store_path(application_path: &Path) -> PathBuf {
    application_path.join(STORE_FILE)
}

pub fn log_path(application_path: &Path) -> PathBuf {
    application_path.join(LOG_DIR)
}
