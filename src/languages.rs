//! Language profile registry
//!
//! Maps platform-facing language labels (the names the UI sends, e.g.
//! "c++", "javascript") to the execution provider's runtime identifier and
//! pinned version. The provider names things differently from the platform
//! ("c++" becomes "cpp"), so the table decouples UI labels from provider
//! naming.

use std::collections::HashMap;
use std::sync::OnceLock;

use anyhow::Context;
use serde::Deserialize;

/// Resolved runtime profile understood by the execution provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageProfile {
    /// Runtime identifier the provider expects (e.g. "cpp", "python")
    pub runtime: String,
    /// Pinned version, or "*" to request the latest available
    pub version: String,
}

/// Raw TOML configuration for a single language
#[derive(Debug, Deserialize)]
struct RawProfile {
    runtime: String,
    version: String,
    #[serde(default)]
    aliases: Vec<String>,
}

/// Global runtime table, fixed after initialization
static RUNTIMES: OnceLock<HashMap<String, LanguageProfile>> = OnceLock::new();

/// Initialize the runtime table from a TOML file
pub fn init_runtimes(path: &str) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read runtime table: {}", path))?;
    init_runtimes_from_str(&content)
}

/// Initialize the runtime table from TOML content
pub fn init_runtimes_from_str(content: &str) -> anyhow::Result<()> {
    let raw: HashMap<String, RawProfile> =
        toml::from_str(content).context("Invalid runtime table")?;

    let mut runtimes = HashMap::new();

    for (name, raw) in raw {
        let profile = LanguageProfile {
            runtime: raw.runtime,
            version: raw.version,
        };

        // Main language label
        runtimes.insert(name.to_lowercase(), profile.clone());

        // Aliases
        for alias in raw.aliases {
            runtimes.insert(alias.to_lowercase(), profile.clone());
        }
    }

    RUNTIMES
        .set(runtimes)
        .map_err(|_| anyhow::anyhow!("Runtime table already initialized"))?;

    Ok(())
}

/// Resolve a language label into a provider profile.
///
/// Lookup is case-insensitive. Unknown labels resolve to a wildcard-version
/// fallback instead of failing: the provider rejects truly unsupported
/// languages itself, and being permissive here means new provider runtimes
/// work without a gateway release. Never errors.
pub fn resolve(language: &str) -> LanguageProfile {
    let key = language.to_lowercase();

    if let Some(profile) = RUNTIMES.get().and_then(|table| table.get(&key)) {
        return profile.clone();
    }

    LanguageProfile {
        runtime: key,
        version: "*".to_string(),
    }
}

/// All language labels the table knows about (including aliases)
pub fn supported_languages() -> Vec<String> {
    let mut names: Vec<String> = RUNTIMES
        .get()
        .map(|table| table.keys().cloned().collect())
        .unwrap_or_default();
    names.sort();
    names
}
