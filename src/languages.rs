//! Language configuration for the solution harnesses

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::core::ExecutionError;

/// Built-in language table, used when no override file is configured
const BUILTIN_LANGUAGES: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/files/languages.toml"));

const PYTHON_HARNESS: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/files/harness.py"));
const JAVASCRIPT_HARNESS: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/files/harness.js"));

/// Backend a submission is executed with.
///
/// `Dynamic` is the Python runtime acquired through the runtime loader,
/// `Native` is the always-available JavaScript evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Language {
    Dynamic,
    Native,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Dynamic => "python",
            Language::Native => "javascript",
        }
    }

    /// Source of the harness script evaluated by this language's interpreter
    pub fn harness_source(&self) -> &'static str {
        match self {
            Language::Dynamic => PYTHON_HARNESS,
            Language::Native => JAVASCRIPT_HARNESS,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Language {
    type Err = ExecutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dynamic" | "python" | "python3" | "py" => Ok(Language::Dynamic),
            "native" | "javascript" | "js" | "node" => Ok(Language::Native),
            _ => Err(ExecutionError::UnsupportedLanguage(s.to_string())),
        }
    }
}

impl TryFrom<String> for Language {
    type Error = ExecutionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Language> for String {
    fn from(language: Language) -> Self {
        language.as_str().to_string()
    }
}

/// Configuration for a supported language backend
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    pub language: Language,
    /// File name the harness script is installed under
    pub harness_file: String,
    /// Command starting the harness, run from the harness directory
    pub run_command: Vec<String>,
    /// Command printing the interpreter version (runtime check)
    pub version_command: Option<Vec<String>>,
    /// Minimum (major, minor) interpreter version accepted by the version check
    pub min_version: Option<(u32, u32)>,
    /// Name of the callable the submission must define
    pub entry_point: String,
    /// Address space limit applied to the interpreter process
    pub memory_limit_mb: Option<u32>,
}

/// Raw TOML configuration for a language
#[derive(Debug, Deserialize)]
struct RawLanguageConfig {
    kind: String,
    harness_file: String,
    run_command: String,
    version_command: Option<String>,
    min_version: Option<String>,
    #[serde(default = "default_entry_point")]
    entry_point: String,
    memory_limit_mb: Option<u32>,
}

fn default_entry_point() -> String {
    "solution".to_string()
}

/// Language table keyed by backend
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    configs: HashMap<Language, LanguageConfig>,
}

impl LanguageRegistry {
    /// Parse the built-in language table
    pub fn builtin() -> anyhow::Result<Self> {
        Self::parse(BUILTIN_LANGUAGES)
    }

    /// Load language configurations from a TOML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read language config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid language config {}", path.display()))
    }

    /// Load from `LANGUAGES_CONFIG` when set, otherwise the built-in table
    pub fn from_env() -> anyhow::Result<Self> {
        match std::env::var("LANGUAGES_CONFIG") {
            Ok(path) => Self::load(Path::new(&path)),
            Err(_) => Self::builtin(),
        }
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let raw_configs: HashMap<String, RawLanguageConfig> = toml::from_str(content)?;

        let mut configs = HashMap::new();
        for (name, raw) in raw_configs {
            let language: Language = raw
                .kind
                .parse()
                .with_context(|| format!("Invalid kind for {}: {}", name, raw.kind))?;

            let run_command = into_command(&raw.run_command);
            if run_command.is_empty() {
                bail!("Empty run_command for {}", name);
            }

            let min_version = raw
                .min_version
                .as_deref()
                .map(|v| {
                    parse_version(v).with_context(|| format!("Invalid min_version for {}: {}", name, v))
                })
                .transpose()?;

            let config = LanguageConfig {
                language,
                harness_file: raw.harness_file,
                run_command,
                version_command: raw.version_command.map(|cmd| into_command(&cmd)),
                min_version,
                entry_point: raw.entry_point,
                memory_limit_mb: raw.memory_limit_mb,
            };

            if configs.insert(language, config).is_some() {
                bail!("Language {} is configured more than once", language);
            }
        }

        Ok(Self { configs })
    }

    /// Get configuration for a language backend
    pub fn get(&self, language: Language) -> anyhow::Result<&LanguageConfig> {
        self.configs
            .get(&language)
            .ok_or_else(|| anyhow::anyhow!("No configuration found for language: {}", language))
    }

    /// List all configured languages
    pub fn languages(&self) -> Vec<Language> {
        self.configs.keys().copied().collect()
    }
}

/// Parse the leading `major.minor` of a version string such as `3.11.4` or `v20.1.0`
pub fn parse_version(version: &str) -> anyhow::Result<(u32, u32)> {
    let version = version.trim().trim_start_matches('v');
    let mut parts = version.split('.');
    let major = parts
        .next()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| anyhow::anyhow!("missing major version"))?
        .parse::<u32>()?;
    let minor = match parts.next() {
        Some(part) => part
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect::<String>()
            .parse::<u32>()
            .unwrap_or(0),
        None => 0,
    };
    Ok((major, minor))
}

fn into_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(|s| s.to_string()).collect()
}
