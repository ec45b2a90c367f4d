//! Registry of admission plugins by name
use crate::{
    error::{Error, Result},
    interfaces::ValidationInterface,
};
use parking_lot::RwLock;
use std::{collections::HashMap, io::Read, sync::Arc};

/// Builds a plugin from its optional configuration
pub type Factory = fn(config: Option<&mut dyn Read>) -> Result<Arc<dyn ValidationInterface>>;

/// Admission plugins known to this process
#[derive(Default)]
pub struct Plugins {
    registry: RwLock<HashMap<String, Factory>>,
}

impl Plugins {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `name`, replacing any earlier registration
    pub fn register(&self, name: &str, factory: Factory) {
        let previous = self.registry.write().insert(name.to_owned(), factory);
        if previous.is_some() {
            tracing::warn!(plugin = name, "admission plugin registered twice");
        }
    }

    /// Whether `name` is registered
    pub fn is_registered(&self, name: &str) -> bool {
        self.registry.read().contains_key(name)
    }

    /// Registered plugin names, sorted
    pub fn registered_names(&self) -> Vec<String> {
        let mut names = self.registry.read().keys().cloned().collect::<Vec<_>>();
        names.sort();
        names
    }

    /// Build the plugin registered as `name`
    pub fn new_from_plugins(
        &self,
        name: &str,
        config: Option<&mut dyn Read>,
    ) -> Result<Arc<dyn ValidationInterface>> {
        let factory = self
            .registry
            .read()
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownPlugin(name.to_owned()))?;
        factory(config)
    }

    /// Build each named plugin without configuration, in order
    pub fn new_chain(&self, names: &[String]) -> Result<Vec<(String, Arc<dyn ValidationInterface>)>> {
        names
            .iter()
            .map(|name| Ok((name.clone(), self.new_from_plugins(name, None)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        attributes::Attributes,
        interfaces::{Handler, Interface},
    };
    use kube::core::admission::Operation;

    struct DenyAll(Handler);

    impl Interface for DenyAll {
        fn handles(&self, operation: &Operation) -> bool {
            self.0.handles(operation)
        }
    }

    impl ValidationInterface for DenyAll {
        fn validate(&self, _: &Attributes) -> Result<()> {
            Err(Error::BadRequest("no".into()))
        }
    }

    fn deny_all(config: Option<&mut dyn Read>) -> Result<Arc<dyn ValidationInterface>> {
        if let Some(config) = config {
            let mut raw = String::new();
            config.read_to_string(&mut raw).map_err(|e| Error::PluginConfig {
                plugin: "DenyAll".into(),
                reason: e.to_string(),
            })?;
            if !raw.is_empty() {
                return Err(Error::PluginConfig {
                    plugin: "DenyAll".into(),
                    reason: "takes no configuration".into(),
                });
            }
        }
        Ok(Arc::new(DenyAll(Handler::new(&[Operation::Delete]))))
    }

    #[test]
    fn builds_registered_plugins() {
        let plugins = Plugins::new();
        plugins.register("DenyAll", deny_all);
        assert!(plugins.is_registered("DenyAll"));
        assert_eq!(plugins.registered_names(), vec!["DenyAll"]);

        let plugin = plugins.new_from_plugins("DenyAll", None).unwrap();
        assert!(plugin.handles(&Operation::Delete));
        assert!(!plugin.handles(&Operation::Create));
    }

    #[test]
    fn passes_configuration_to_the_factory() {
        let plugins = Plugins::new();
        plugins.register("DenyAll", deny_all);
        let mut config: &[u8] = b"strict: true";
        let err = plugins
            .new_from_plugins("DenyAll", Some(&mut config))
            .err()
            .unwrap();
        assert!(matches!(err, Error::PluginConfig { .. }));
    }

    #[test]
    fn unknown_plugins_are_errors() {
        let plugins = Plugins::new();
        let err = plugins.new_chain(&["Missing".to_owned()]).err().unwrap();
        assert_eq!(err.to_string(), "unknown admission plugin: Missing");
    }
}
