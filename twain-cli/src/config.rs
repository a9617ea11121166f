use anyhow::{Context, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use twain_core::OperatingHours;

use crate::state::{ensure_twain_home, twain_home};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub hours: HoursSection,
    #[serde(default)]
    pub solver: SolverSection,
}

/// The user's operating hours, in their own zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoursSection {
    /// IANA zone, e.g. "America/Chicago".
    pub timezone: String,
    /// "HH:MM"
    pub start: String,
    /// "HH:MM"
    pub end: String,
    pub weekends: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSection {
    /// Wall-clock budget for one scheduling run.
    pub timeout_secs: u64,
}

impl Default for HoursSection {
    fn default() -> Self {
        Self {
            timezone: "America/Chicago".to_string(),
            start: "08:00".to_string(),
            end: "16:00".to_string(),
            weekends: false,
        }
    }
}

impl Default for SolverSection {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl Config {
    /// Validated operating hours. Fails on an unknown zone or bad window.
    pub fn operating_hours(&self) -> Result<OperatingHours> {
        let start = parse_clock(&self.hours.start).context("[hours].start")?;
        let end = parse_clock(&self.hours.end).context("[hours].end")?;
        Ok(OperatingHours::new(
            &self.hours.timezone,
            start,
            end,
            self.hours.weekends,
        )?)
    }
}

fn parse_clock(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .with_context(|| format!("expected HH:MM, got '{s}'"))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(twain_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn parse_config(s: &str) -> Result<Config> {
    Ok(toml::from_str(s)?)
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = ensure_twain_home()?.join("config.toml");
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}
