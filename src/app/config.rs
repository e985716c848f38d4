use crate::app::error::Error;
use crate::app::models::{DumpConfig, Source};
use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// User-level defaults, read from `~/.config/screwdriver/settings.toml`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Folder suffixes skipped when listing candidates for a new template.
    pub listing_ignores: Vec<String>,
    /// Ignores written into a new template's front matter.
    pub template_ignores: Vec<String>,
    pub fetch_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listing_ignores: vec!["node_modules".into(), ".git".into()],
            template_ignores: vec!["/node_modules".into(), "/.git".into()],
            fetch_timeout_secs: 30,
        }
    }
}

impl Settings {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

fn default_settings_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home
        .join(".config")
        .join("screwdriver")
        .join("settings.toml"))
}

/// An explicit path must exist; the default location is optional.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    let config_path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = default_settings_path()?;
            if !path.exists() {
                log::debug!("No settings at {:?}, using defaults", path);
                return Ok(Settings::default());
            }
            path
        }
    };

    let content = fs::read_to_string(&config_path)
        .context(format!("Failed to read settings at {:?}", config_path))?;
    parse_settings(&content).context(format!("Failed to parse {:?}", config_path))
}

fn parse_settings(content: &str) -> Result<Settings> {
    Ok(toml::from_str(content)?)
}

/// Splits a document into its front matter text and the body after it.
///
/// The header is everything between the leading `---` and the first line
/// that starts with `---`.
pub fn split_front_matter(document: &str) -> Result<(&str, &str), Error> {
    if !document.starts_with("---") {
        return Err(Error::MissingFrontMatter);
    }
    let end = document[3..]
        .find("\n---")
        .map(|i| i + 3)
        .ok_or(Error::MissingFrontMatter)?;
    let header = &document[3..end];
    let after_delimiter = &document[end + 1..];
    let body = after_delimiter
        .find('\n')
        .map_or("", |i| &after_delimiter[i + 1..]);
    Ok((header, body))
}

/// A YAML value that may be written as a list or as a single string.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum StringList {
    Many(Vec<Option<String>>),
    One(String),
}

impl StringList {
    fn into_items(self, split_commas: bool) -> Vec<String> {
        let raw: Vec<String> = match self {
            StringList::Many(items) => items.into_iter().flatten().collect(),
            StringList::One(item) if split_commas => {
                item.split(',').map(str::to_string).collect()
            }
            StringList::One(item) => vec![item],
        };
        raw.into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct FrontMatter {
    target: Option<StringList>,
    targets: Option<StringList>,
    ignores: Option<StringList>,
    filters: Option<StringList>,
    urls: Option<StringList>,
}

fn items(list: Option<StringList>, split_commas: bool) -> Vec<String> {
    list.map(|l| l.into_items(split_commas)).unwrap_or_default()
}

/// Parses the front matter of `document` into a dump configuration.
pub fn parse_dump_config(document: &str) -> Result<DumpConfig, Error> {
    let (header, _) = split_front_matter(document)?;

    let value: serde_yaml::Value = serde_yaml::from_str(header)
        .map_err(|e| Error::Config(format!("malformed front matter: {}", e)))?;
    let front: FrontMatter = if value.is_null() {
        FrontMatter::default()
    } else {
        serde_yaml::from_value(value)
            .map_err(|e| Error::Config(format!("malformed front matter: {}", e)))?
    };

    let mut targets = items(front.targets, false);
    for legacy in items(front.target, false) {
        if !targets.contains(&legacy) {
            targets.push(legacy);
        }
    }
    let urls = items(front.urls, false);

    let sources: Vec<Source> = targets
        .into_iter()
        .map(Source::LocalDirectory)
        .chain(urls.into_iter().map(Source::RemoteUrl))
        .collect();
    if sources.is_empty() {
        return Err(Error::Config("no targets or urls specified".into()));
    }

    let filters = items(front.filters, false)
        .iter()
        .map(|pattern| {
            Regex::new(pattern)
                .map_err(|e| Error::Config(format!("invalid filter {:?}: {}", pattern, e)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DumpConfig {
        header: header.to_string(),
        sources,
        ignores: items(front.ignores, true),
        filters,
    })
}
