//! Explicitly constructed configuration for the cognition core
//!
//! Provider credentials and timeout defaults are loaded once from the
//! environment into an immutable value that gets passed into the registry
//! and dispatcher — no hidden global state, test doubles stay trivial.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::llm::{Capability, ProviderId};

/// Capabilities assumed when a provider entry does not list any.
const DEFAULT_CAPABILITIES: [Capability; 2] = [Capability::Chat, Capability::Stream];

/// Per-provider credential, model, and capability settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub default_model: Option<String>,
    /// Models this deployment may request; empty means unrestricted.
    #[serde(default)]
    pub supported_models: Vec<String>,
    /// Capabilities enabled for this provider; empty means the default
    /// chat + stream set.
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

impl ProviderSettings {
    pub fn with_key(key: impl Into<String>) -> Self {
        Self { api_key: Some(key.into()), ..Default::default() }
    }

    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.supported_models = models;
        self
    }

    pub fn with_capabilities(mut self, capabilities: Vec<Capability>) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().map(|k| !k.is_empty()).unwrap_or(false)
    }

    pub fn supports(&self, capability: Capability) -> bool {
        if self.capabilities.is_empty() {
            DEFAULT_CAPABILITIES.contains(&capability)
        } else {
            self.capabilities.contains(&capability)
        }
    }

    /// Whether a requested model override is acceptable here.
    pub fn allows_model(&self, model: &str) -> bool {
        self.supported_models.is_empty() || self.supported_models.iter().any(|m| m == model)
    }
}

/// Per-call timeout defaults by request class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeouts {
    pub chat_secs: u64,
    pub generation_secs: u64,
    pub health_check_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            chat_secs: 30,
            generation_secs: 60,
            health_check_secs: 10,
        }
    }
}

impl Timeouts {
    pub fn for_kind(&self, kind: crate::types::RequestKind) -> Duration {
        let secs = match kind {
            crate::types::RequestKind::Chat => self.chat_secs,
            crate::types::RequestKind::Generation => self.generation_secs,
            crate::types::RequestKind::HealthCheck => self.health_check_secs,
        };
        Duration::from_secs(secs)
    }
}

/// Full configuration consumed by the core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoreConfig {
    #[serde(default)]
    pub providers: HashMap<ProviderId, ProviderSettings>,
    #[serde(default)]
    pub timeouts: Timeouts,
    /// Agent kind → preferred provider order, consulted before the fixed
    /// fallback chain.
    #[serde(default)]
    pub affinity: HashMap<String, Vec<ProviderId>>,
}

impl CoreConfig {
    /// Load provider credentials and model overrides from the environment.
    pub fn from_env() -> Self {
        let mut providers = HashMap::new();
        for provider in ProviderId::ALL {
            let settings = ProviderSettings {
                api_key: std::env::var(provider.key_env_var()).ok().filter(|k| !k.is_empty()),
                default_model: std::env::var(provider.model_env_var()).ok(),
                ..Default::default()
            };
            providers.insert(provider, settings);
        }
        Self {
            providers,
            timeouts: Timeouts::default(),
            affinity: HashMap::new(),
        }
    }

    /// Builder-style credential insertion, used by tests and embedders.
    pub fn with_provider(mut self, provider: ProviderId, settings: ProviderSettings) -> Self {
        self.providers.insert(provider, settings);
        self
    }

    /// Builder-style affinity entry for one agent kind.
    pub fn with_affinity(mut self, agent_kind: impl Into<String>, order: Vec<ProviderId>) -> Self {
        self.affinity.insert(agent_kind.into(), order);
        self
    }

    pub fn settings(&self, provider: ProviderId) -> Option<&ProviderSettings> {
        self.providers.get(&provider)
    }

    pub fn is_configured(&self, provider: ProviderId) -> bool {
        self.settings(provider).map(|s| s.is_configured()).unwrap_or(false)
    }

    /// Reject configurations that are clearly broken.
    pub fn validate(&self) -> Result<(), String> {
        if self.timeouts.chat_secs == 0
            || self.timeouts.generation_secs == 0
            || self.timeouts.health_check_secs == 0
        {
            return Err("timeouts must be > 0".into());
        }
        Ok(())
    }
}
