use {super::connector::ChannelConnector, std::collections::HashMap, std::sync::Arc};

/// Registry of connectors, indexed by channel name and populated once at
/// startup. No dynamic loading.
#[derive(Default)]
pub struct ConnectorRegistry {
    connectors: HashMap<String, Arc<dyn ChannelConnector>>,
}

impl ConnectorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            connectors: HashMap::new(),
        }
    }

    pub fn register(&mut self, connector: Arc<dyn ChannelConnector>) {
        self.connectors
            .insert(connector.name().to_string(), connector);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn ChannelConnector>> {
        self.connectors.get(&name.to_ascii_lowercase()).cloned()
    }

    #[must_use]
    pub fn list(&self) -> Vec<&str> {
        self.connectors.keys().map(String::as_str).collect()
    }
}
