//! Provider registry: configuration checks and candidate resolution
//!
//! An immutable value built from `CoreConfig` and passed into the
//! dispatcher. Resolution fails closed: no configured providers means an
//! empty candidate list, and the caller decides what to tell the user.

use crate::config::CoreConfig;

use super::{Capability, ProviderId};

pub struct ProviderRegistry {
    config: CoreConfig,
}

impl ProviderRegistry {
    pub fn new(config: CoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Whether a credential is present for the provider.
    pub fn is_configured(&self, provider: ProviderId) -> bool {
        self.config.is_configured(provider)
    }

    /// Whether the provider has the capability enabled. Unknown providers
    /// support nothing.
    pub fn supports(&self, provider: ProviderId, capability: Capability) -> bool {
        self.config
            .settings(provider)
            .map(|s| s.supports(capability))
            .unwrap_or(false)
    }

    /// Model to use for a provider: request override → configured default →
    /// built-in default. An override outside the provider's supported-model
    /// set is ignored.
    pub fn model_for(&self, provider: ProviderId, override_model: Option<&str>) -> String {
        if let Some(model) = override_model {
            let allowed = self
                .config
                .settings(provider)
                .map(|s| s.allows_model(model))
                .unwrap_or(true);
            if allowed {
                return model.to_string();
            }
            tracing::debug!(provider = ?provider, model = model, "Model override not supported, using default");
        }
        self.config
            .settings(provider)
            .and_then(|s| s.default_model.clone())
            .unwrap_or_else(|| provider.default_model().to_string())
    }

    pub fn api_key(&self, provider: ProviderId) -> Option<&str> {
        self.config.settings(provider).and_then(|s| s.api_key.as_deref())
    }

    /// Ordered candidate providers for an agent kind: affinity preferences
    /// first, then the fixed fallback chain, deduplicated, filtered to
    /// configured providers only.
    pub fn resolve(&self, agent_kind: &str) -> Vec<ProviderId> {
        let mut candidates = Vec::new();
        if let Some(preferred) = self.config.affinity.get(agent_kind) {
            for &provider in preferred {
                if !candidates.contains(&provider) {
                    candidates.push(provider);
                }
            }
        }
        for provider in ProviderId::ALL {
            if !candidates.contains(&provider) {
                candidates.push(provider);
            }
        }
        candidates.retain(|&p| self.is_configured(p));
        candidates
    }
}
