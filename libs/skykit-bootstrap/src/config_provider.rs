use crate::config::AppConfig;
use std::sync::Arc;

/// Read access to the loaded configuration, by component and by section.
pub trait ConfigProvider: Send + Sync {
    /// Keyword arguments for one component's declared configs.
    fn component_config(&self, component: &str) -> Option<&serde_json::Value>;

    /// A whole top-level section as JSON.
    fn get_config_raw(&self, key: &str) -> Option<serde_json::Value>;
}

pub struct AppConfigProvider(Arc<AppConfig>);

impl AppConfigProvider {
    pub fn new(config: AppConfig) -> Self {
        Self(Arc::new(config))
    }

    pub fn from_arc(config: Arc<AppConfig>) -> Self {
        Self(config)
    }

    pub fn inner(&self) -> &AppConfig {
        &self.0
    }
}

impl ConfigProvider for AppConfigProvider {
    fn component_config(&self, component: &str) -> Option<&serde_json::Value> {
        self.0.components.get(component)
    }

    fn get_config_raw(&self, key: &str) -> Option<serde_json::Value> {
        match key {
            "server" => serde_json::to_value(&self.0.server).ok(),
            "logging" => self
                .0
                .logging
                .as_ref()
                .and_then(|v| serde_json::to_value(v).ok()),
            "bindings" => serde_json::to_value(&self.0.bindings).ok(),
            "components" => serde_json::to_value(&self.0.components).ok(),
            _ => None,
        }
    }
}
