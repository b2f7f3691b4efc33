use anyhow::anyhow;
use std::path::PathBuf;

pub const FRACTAL_DB_PATH_ENV: &str = "FRACTAL_DB_PATH";

pub(crate) fn optional_trimmed_path_from_env(name: &str) -> anyhow::Result<Option<PathBuf>> {
    let value = match std::env::var_os(name) {
        Some(value) => value,
        None => return Ok(None),
    };

    let value = value.to_string_lossy();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("{name} is set but empty"));
    }

    Ok(Some(PathBuf::from(trimmed)))
}

/// `FRACTAL_DB_PATH`, else `$HOME/fractal/fractal.db`, else a file under the
/// system temp dir.
pub fn resolve_db_path() -> anyhow::Result<PathBuf> {
    if let Some(path) = optional_trimmed_path_from_env(FRACTAL_DB_PATH_ENV)? {
        return Ok(path);
    }

    let root = home_dir()
        .map(|home| home.join("fractal"))
        .unwrap_or_else(|_| std::env::temp_dir().join("fractal"));
    Ok(root.join("fractal.db"))
}

pub(crate) fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var_os("HOME").ok_or_else(|| anyhow!("HOME is not set"))?;
    if home.is_empty() {
        return Err(anyhow!("HOME is set but empty"));
    }
    Ok(PathBuf::from(home))
}

#[cfg(test)]
pub(crate) fn lock_env_for_tests() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
