//! Language configuration for compilation and execution

use std::collections::HashMap;

use anyhow::Context;
use serde::Deserialize;

use crate::error::JudgeError;

/// Static configuration for a supported programming language
#[derive(Debug, Clone)]
pub struct LanguageSpec {
    /// Name of the source file written into the workspace (e.g., "main.cpp")
    pub source_file: String,
    /// Compile command (None for interpreted languages)
    pub compile_command: Option<Vec<String>>,
    /// Run command
    pub run_command: Vec<String>,
}

impl LanguageSpec {
    pub fn is_compiled(&self) -> bool {
        self.compile_command.is_some()
    }
}

/// Raw TOML configuration for a language
#[derive(Debug, Deserialize)]
struct RawLanguageSpec {
    source_file: String,
    compile_command: Option<String>,
    run_command: String,
    #[serde(default)]
    aliases: Vec<String>,
}

/// Read-only table mapping language tags to their specs.
/// Built once at startup; aliases resolve to the same spec.
#[derive(Debug, Clone)]
pub struct LanguageTable {
    languages: HashMap<String, LanguageSpec>,
}

impl LanguageTable {
    /// Parse a language table from TOML content
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let raw_specs: HashMap<String, RawLanguageSpec> =
            toml::from_str(content).context("Failed to parse language configuration")?;

        let mut languages = HashMap::new();

        for (name, raw) in raw_specs {
            if raw.run_command.trim().is_empty() {
                anyhow::bail!("Empty run command for language {}", name);
            }

            let spec = LanguageSpec {
                source_file: raw.source_file,
                compile_command: raw.compile_command.map(|cmd| into_command(&cmd)),
                run_command: into_command(&raw.run_command),
            };

            // A colliding tag or alias must fail loudly at startup, not
            // resolve to whichever entry the map iterated last.
            let tag = name.to_lowercase();
            if languages.insert(tag.clone(), spec.clone()).is_some() {
                anyhow::bail!("Duplicate language tag or alias: {}", tag);
            }

            for alias in raw.aliases {
                let alias = alias.to_lowercase();
                if languages.insert(alias.clone(), spec.clone()).is_some() {
                    anyhow::bail!("Duplicate language tag or alias: {}", alias);
                }
            }
        }

        Ok(Self { languages })
    }

    /// Load the built-in language table shipped with the binary
    pub fn builtin() -> anyhow::Result<Self> {
        let content = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/files/languages.toml"));
        Self::from_toml(content)
    }

    /// Resolve a language tag to its spec.
    /// Fails before any filesystem or process work happens.
    pub fn resolve(&self, tag: &str) -> Result<&LanguageSpec, JudgeError> {
        self.languages
            .get(&tag.to_lowercase())
            .ok_or_else(|| JudgeError::UnsupportedLanguage(tag.to_string()))
    }

    /// All known tags, including aliases
    pub fn supported(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.languages.keys().cloned().collect();
        tags.sort();
        tags
    }
}

fn into_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(|s| s.to_string()).collect()
}
