//! Configuration loading and provider factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use bandscore_core::course::{CourseCatalog, CourseSettings};
use bandscore_core::lexicon::LexiconTables;
use bandscore_core::traits::ScoringProvider;
use bandscore_core::{ScoringService, ServiceConfig};

use crate::fallback::{FallbackChain, RetryPolicy};
use crate::openai::OpenAiProvider;
use crate::rule_based::RuleBasedProvider;

/// Name under which the local rule engine is always available.
pub const RULE_BASED: &str = "rule_based";

/// Configuration for a single scoring provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    #[serde(rename = "openai")]
    OpenAI {
        api_key: String,
        #[serde(default)]
        model: Option<String>,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        org_id: Option<String>,
    },
    RuleBased,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::OpenAI {
                api_key: _,
                model,
                base_url,
                org_id,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("model", model)
                .field("base_url", base_url)
                .field("org_id", org_id)
                .finish(),
            ProviderConfig::RuleBased => f.write_str("RuleBased"),
        }
    }
}

/// Top-level bandscore configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandscoreConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Providers to try, in order. Empty means every configured provider by
    /// name. The rule-based provider is appended when missing.
    #[serde(default)]
    pub provider_order: Vec<String>,
    /// Reject unknown work types instead of scoring them as general work.
    #[serde(default)]
    pub strict_work_type: bool,
    /// Max retries per provider on transient errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Max concurrent evaluations in batch runs.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Output directory for batch reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Optional TOML file replacing the built-in lexicon tables.
    #[serde(default)]
    pub lexicon: Option<PathBuf>,
    #[serde(default)]
    pub course: CourseSettings,
}

fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    1000
}
fn default_parallelism() -> usize {
    4
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./bandscore-results")
}

impl Default for BandscoreConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            provider_order: Vec::new(),
            strict_work_type: false,
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            parallelism: default_parallelism(),
            output_dir: default_output_dir(),
            lexicon: None,
            course: CourseSettings::default(),
        }
    }
}

impl BandscoreConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            strict_work_type: self.strict_work_type,
            course: self.course.clone(),
        }
    }

    /// Provider names in the order the chain tries them.
    pub fn effective_order(&self) -> Vec<String> {
        let mut order = if self.provider_order.is_empty() {
            let mut names: Vec<String> = self.providers.keys().cloned().collect();
            names.sort();
            names
        } else {
            self.provider_order.clone()
        };
        if !order.iter().any(|n| n == RULE_BASED) {
            order.push(RULE_BASED.to_string());
        }
        order
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Resolve env vars in a provider config.
fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::OpenAI {
            api_key,
            model,
            base_url,
            org_id,
        } => ProviderConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            model: model.as_ref().map(|m| resolve_env_vars(m)),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
            org_id: org_id.as_ref().map(|o| resolve_env_vars(o)),
        },
        ProviderConfig::RuleBased => ProviderConfig::RuleBased,
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `bandscore.toml` in the current directory
/// 2. `~/.config/bandscore/config.toml`
///
/// `BANDSCORE_OPENAI_KEY` overrides (or creates) the `openai` provider key.
pub fn load_config() -> Result<BandscoreConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<BandscoreConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("bandscore.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<BandscoreConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => BandscoreConfig::default(),
    };

    if let Ok(key) = std::env::var("BANDSCORE_OPENAI_KEY") {
        apply_openai_key(&mut config, key);
    }

    let resolved: HashMap<String, ProviderConfig> = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();
    config.providers = resolved;

    Ok(config)
}

fn apply_openai_key(config: &mut BandscoreConfig, key: String) {
    config
        .providers
        .entry("openai".into())
        .or_insert(ProviderConfig::OpenAI {
            api_key: String::new(),
            model: None,
            base_url: None,
            org_id: None,
        });
    if let Some(ProviderConfig::OpenAI { api_key, .. }) = config.providers.get_mut("openai") {
        *api_key = key;
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("bandscore"))
}

/// Build the scoring service, loading replacement lexicon tables if set.
pub fn build_service(config: &BandscoreConfig) -> Result<ScoringService> {
    let lexicon = match &config.lexicon {
        Some(path) => Arc::new(LexiconTables::load(path)?),
        None => LexiconTables::shared(),
    };
    Ok(ScoringService::new(
        lexicon,
        CourseCatalog::default(),
        config.service_config(),
    ))
}

/// Create a provider instance from its configuration.
pub fn create_provider(
    config: &ProviderConfig,
    service: &ScoringService,
) -> Result<Arc<dyn ScoringProvider>> {
    match config {
        ProviderConfig::OpenAI {
            api_key,
            model,
            base_url,
            org_id,
        } => {
            if api_key.is_empty() {
                anyhow::bail!("openai provider has no API key");
            }
            let mut provider = OpenAiProvider::new(api_key, base_url.clone(), org_id.clone())
                .with_service(service.clone());
            if let Some(model) = model {
                provider = provider.with_model(model.clone());
            }
            Ok(Arc::new(provider))
        }
        ProviderConfig::RuleBased => Ok(Arc::new(RuleBasedProvider::new(service.clone()))),
    }
}

/// Build the provider chain. With `offline` set only the rule-based provider
/// is used. Providers that are unknown or cannot be created are skipped with
/// a warning.
pub fn build_chain(config: &BandscoreConfig, offline: bool) -> Result<FallbackChain> {
    let service = build_service(config)?;

    let order = if offline {
        vec![RULE_BASED.to_string()]
    } else {
        config.effective_order()
    };

    let mut providers: Vec<Arc<dyn ScoringProvider>> = Vec::new();
    for name in &order {
        let provider = match config.providers.get(name) {
            Some(provider_config) => create_provider(provider_config, &service),
            None if name == RULE_BASED => create_provider(&ProviderConfig::RuleBased, &service),
            None => Err(anyhow::anyhow!("no provider named '{name}' is configured")),
        };
        match provider {
            Ok(provider) => providers.push(provider),
            Err(e) => warn!(provider = %name, "skipping provider: {e:#}"),
        }
    }

    debug!(providers = ?order, "provider chain built");
    Ok(FallbackChain::new(providers, config.retry_policy()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_BANDSCORE_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_BANDSCORE_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_BANDSCORE_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        std::env::remove_var("_BANDSCORE_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = BandscoreConfig::default();
        assert_eq!(config.parallelism, 4);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay_ms, 1000);
        assert_eq!(config.effective_order(), vec!["rule_based"]);
    }

    #[test]
    fn parse_provider_config() {
        let toml_str = r#"
provider_order = ["openai"]
strict_work_type = true
parallelism = 8

[course]
speaking_weeks = 8

[providers.openai]
type = "openai"
api_key = "sk-openai"
model = "gpt-3.5-turbo"

[providers.local]
type = "rule_based"
"#;
        let config: BandscoreConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.providers.len(), 2);
        assert!(matches!(
            config.providers.get("openai"),
            Some(ProviderConfig::OpenAI { model: Some(m), .. }) if m == "gpt-3.5-turbo"
        ));
        assert!(matches!(
            config.providers.get("local"),
            Some(ProviderConfig::RuleBased)
        ));
        assert!(config.strict_work_type);
        assert_eq!(config.parallelism, 8);
        assert_eq!(config.course.speaking_weeks, 8);
        assert_eq!(config.effective_order(), vec!["openai", "rule_based"]);
    }

    #[test]
    fn debug_masks_api_key() {
        let config = ProviderConfig::OpenAI {
            api_key: "sk-secret".into(),
            model: None,
            base_url: None,
            org_id: None,
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn env_key_creates_openai_provider() {
        let mut config = BandscoreConfig::default();
        apply_openai_key(&mut config, "sk-env".into());
        assert!(matches!(
            config.providers.get("openai"),
            Some(ProviderConfig::OpenAI { api_key, .. }) if api_key == "sk-env"
        ));
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bandscore.toml");
        std::fs::write(
            &path,
            "max_retries = 1\n\n[providers.openai]\ntype = \"openai\"\napi_key = \"${_BANDSCORE_UNSET_KEY}\"\n",
        )
        .unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.max_retries, 1);
        assert!(config.providers.contains_key("openai"));

        assert!(load_config_from(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn chain_always_ends_with_rule_based() {
        let mut config = BandscoreConfig::default();
        config.providers.insert(
            "openai".into(),
            ProviderConfig::OpenAI {
                api_key: "sk-test".into(),
                model: None,
                base_url: None,
                org_id: None,
            },
        );
        config.provider_order = vec!["openai".into()];

        let chain = build_chain(&config, false).unwrap();
        assert_eq!(chain.provider_names(), vec!["openai", "rule_based"]);

        let offline = build_chain(&config, true).unwrap();
        assert_eq!(offline.provider_names(), vec!["rule_based"]);
    }

    #[test]
    fn providers_without_keys_are_skipped() {
        let mut config = BandscoreConfig::default();
        apply_openai_key(&mut config, String::new());
        config.provider_order = vec!["openai".into(), "missing".into()];

        let chain = build_chain(&config, false).unwrap();
        assert_eq!(chain.provider_names(), vec!["rule_based"]);
    }

    #[test]
    fn missing_lexicon_file_is_an_error() {
        let config = BandscoreConfig {
            lexicon: Some(PathBuf::from("/nonexistent/lexicon.toml")),
            ..Default::default()
        };
        assert!(build_service(&config).is_err());
    }
}
