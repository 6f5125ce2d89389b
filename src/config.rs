use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub index: IndexConfig,
    pub documents: DocumentsConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_index_name")]
    pub name: String,
    #[serde(default)]
    pub doc_type: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider() -> String {
    "elasticsearch".to_string()
}
fn default_index_name() -> String {
    "docket".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocumentsConfig {
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default = "default_synopsis_lines")]
    pub synopsis_lines: usize,
}

fn default_include_globs() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_synopsis_lines() -> usize {
    crate::parser::DEFAULT_SYNOPSIS_LINES
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
    #[serde(default = "default_static_route")]
    pub static_route: String,
}

fn default_static_route() -> String {
    "/static/text".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.db.max_connections == 0 {
        anyhow::bail!("db.max_connections must be >= 1");
    }
    if config.db.timeout_secs == 0 {
        anyhow::bail!("db.timeout_secs must be > 0");
    }

    if config.documents.synopsis_lines == 0 {
        anyhow::bail!("documents.synopsis_lines must be >= 1");
    }

    match config.index.provider.as_str() {
        "elasticsearch" => {
            if config.index.url.as_deref().map_or(true, |u| u.trim().is_empty()) {
                anyhow::bail!("index.url must be set when provider is 'elasticsearch'");
            }
        }
        "memory" => {}
        other => anyhow::bail!(
            "Unknown index provider: '{}'. Must be elasticsearch or memory.",
            other
        ),
    }
    if config.index.name.trim().is_empty() {
        anyhow::bail!("index.name must not be empty");
    }
    if config.index.timeout_secs == 0 {
        anyhow::bail!("index.timeout_secs must be > 0");
    }

    if !config.server.static_route.starts_with('/') {
        anyhow::bail!("server.static_route must start with '/'");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Config {
        toml::from_str(s).unwrap()
    }

    const MINIMAL: &str = r#"
[db]
path = "/tmp/docket.sqlite"

[index]
provider = "memory"

[documents]
root = "/tmp/text"

[server]
bind = "127.0.0.1:8081"
"#;

    #[test]
    fn test_defaults_applied() {
        let cfg = parse(MINIMAL);
        validate(&cfg).unwrap();
        assert_eq!(cfg.db.max_connections, 5);
        assert_eq!(cfg.documents.synopsis_lines, 5);
        assert_eq!(cfg.documents.include_globs, vec!["*".to_string()]);
        assert_eq!(cfg.index.name, "docket");
        assert!(cfg.index.doc_type.is_none());
        assert_eq!(cfg.server.static_route, "/static/text");
    }

    #[test]
    fn test_elasticsearch_requires_url() {
        let cfg = parse(&MINIMAL.replace("provider = \"memory\"", "provider = \"elasticsearch\""));
        let err = validate(&cfg).unwrap_err();
        assert!(err.to_string().contains("index.url"));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let cfg = parse(&MINIMAL.replace("memory", "solr"));
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_zero_synopsis_lines_rejected() {
        let cfg = parse(&MINIMAL.replace(
            "root = \"/tmp/text\"",
            "root = \"/tmp/text\"\nsynopsis_lines = 0",
        ));
        assert!(validate(&cfg).is_err());
    }
}
