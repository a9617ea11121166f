use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$TWAIN_HOME`, or `~/.twain`.
pub fn twain_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("TWAIN_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".twain"))
}

pub fn ensure_twain_home() -> Result<PathBuf> {
    let dir = twain_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
