//! User preferences persisted beside the projects

use appforge_core::prelude::*;
use appforge_core::Plan;
use appforge_store::{keys, JsonStoreExt, SharedStore};

#[derive(Debug, Clone)]
pub struct Preferences {
    store: SharedStore,
    default_model: String,
}

impl Preferences {
    pub fn new(store: SharedStore, default_model: impl Into<String>) -> Self {
        Self {
            store,
            default_model: default_model.into(),
        }
    }

    /// Model API key, read from either of its two keys
    pub fn api_key(&self) -> Option<String> {
        self.store
            .read_string(keys::API_KEY)
            .or_else(|| self.store.read_string(keys::GEMINI_API_KEY))
            .filter(|key| !key.is_empty())
    }

    /// Store the API key under both keys, or clear both with `None`
    pub fn set_api_key(&self, key: Option<&str>) -> Result<()> {
        match key.map(str::trim).filter(|k| !k.is_empty()) {
            Some(key) => {
                self.store.write_string(keys::API_KEY, key)?;
                self.store.write_string(keys::GEMINI_API_KEY, key)
            }
            None => {
                self.store.remove(keys::API_KEY)?;
                self.store.remove(keys::GEMINI_API_KEY)
            }
        }
    }

    /// Plan chosen without an account; Free when unset or unreadable
    pub fn claimed_plan(&self) -> Plan {
        match self.store.read_string(keys::CLAIMED_PLAN) {
            Some(name) => Plan::parse(&name).unwrap_or_else(|| {
                warn!("Unknown claimed plan '{}', using FREE", name);
                Plan::Free
            }),
            None => Plan::Free,
        }
    }

    pub fn set_claimed_plan(&self, plan: Plan) -> Result<()> {
        self.store.write_string(keys::CLAIMED_PLAN, plan.as_str())
    }

    pub fn selected_model(&self) -> String {
        self.store
            .read_string(keys::SELECTED_MODEL)
            .filter(|model| !model.trim().is_empty())
            .unwrap_or_else(|| self.default_model.clone())
    }

    pub fn set_selected_model(&self, model: &str) -> Result<()> {
        let model = model.trim();
        if model.is_empty() {
            return Err(Error::validation("Model id cannot be empty"));
        }
        self.store.write_string(keys::SELECTED_MODEL, model)
    }
}
