use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;

const SETTINGS_FILE: &str = "server.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub database_url: String,
    pub allowed_origins: Vec<String>,
    pub require_end_after_start: bool,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:5000".into(),
            database_url: "sqlite://./data/events.db".into(),
            allowed_origins: vec!["http://localhost:5173".into()],
            require_end_after_start: false,
            log_filter: "info".into(),
        }
    }
}

pub fn load_settings() -> Settings {
    let file_contents = fs::read_to_string(SETTINGS_FILE).ok();
    settings_from_sources(file_contents.as_deref(), |key| std::env::var(key).ok())
}

/// Layers defaults, then `server.toml` contents, then environment lookups.
pub fn settings_from_sources(
    file_contents: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(file_cfg) = file_contents.and_then(|raw| raw.parse::<toml::Table>().ok()) {
        if let Some(v) = file_cfg.get("bind_addr").and_then(|v| v.as_str()) {
            settings.server_bind = v.to_string();
        }
        if let Some(port) = file_cfg.get("port").and_then(|v| v.as_integer()) {
            settings.server_bind = with_port(&settings.server_bind, &port.to_string());
        }
        if let Some(v) = file_cfg.get("database_url").and_then(|v| v.as_str()) {
            settings.database_url = v.to_string();
        }
        match file_cfg.get("allowed_origins") {
            Some(toml::Value::String(list)) => settings.allowed_origins = parse_origin_list(list),
            Some(toml::Value::Array(items)) => {
                settings.allowed_origins = items
                    .iter()
                    .filter_map(|item| item.as_str())
                    .flat_map(parse_origin_list)
                    .collect();
            }
            _ => {}
        }
        if let Some(v) = file_cfg
            .get("require_end_after_start")
            .and_then(|v| v.as_bool())
        {
            settings.require_end_after_start = v;
        }
        if let Some(v) = file_cfg.get("log_filter").and_then(|v| v.as_str()) {
            settings.log_filter = v.to_string();
        }
    }

    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }
    if let Some(port) = env("PORT").filter(|port| port.trim().parse::<u16>().is_ok()) {
        settings.server_bind = with_port(&settings.server_bind, port.trim());
    }

    if let Some(v) = env("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = env("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = env("ALLOWED_ORIGINS") {
        settings.allowed_origins = parse_origin_list(&v);
    }
    if let Some(v) = env("APP__ALLOWED_ORIGINS") {
        settings.allowed_origins = parse_origin_list(&v);
    }

    if let Some(v) = env("APP__REQUIRE_END_AFTER_START") {
        if let Ok(parsed) = v.trim().parse::<bool>() {
            settings.require_end_after_start = parsed;
        }
    }

    if let Some(v) = env("RUST_LOG") {
        settings.log_filter = v;
    }

    settings
}

fn with_port(bind: &str, port: &str) -> String {
    let host = bind
        .rsplit_once(':')
        .map(|(host, _)| host)
        .filter(|host| !host.is_empty())
        .unwrap_or("0.0.0.0");
    format!("{host}:{port}")
}

pub fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:") {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite://") {
        if is_windows_drive_path(path) {
            return format!("sqlite:{}", path.replace('\\', "/"));
        }
        return raw_database_url.to_string();
    }

    if raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    let path = raw_database_url
        .strip_prefix("sqlite:")
        .unwrap_or(raw_database_url)
        .replace('\\', "/");
    if is_windows_drive_path(&path) {
        return format!("sqlite:{path}");
    }
    format!("sqlite://{path}")
}

fn is_windows_drive_path(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'/' || bytes[2] == b'\\')
}

fn ensure_parent_dir_exists(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
