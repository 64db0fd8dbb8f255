use std::{collections::HashMap, sync::Arc};

use crate::{
    drivers,
    errors::ConfigurationError,
    logging::{Dispatcher, Driver, Severity},
};

use super::{Config, DriverSettings, DriverSpec};

pub type DriverConstructor = Box<
    dyn Fn(&DriverSettings<'_>) -> Result<Arc<dyn Driver>, ConfigurationError> + Send + Sync,
>;

/// Maps driver type tags to constructors.
pub struct DriverRegistry {
    constructors: HashMap<String, DriverConstructor>,
}

impl DriverRegistry {
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Registry with every driver shipped in this crate.
    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        drivers::register_builtin(&mut registry);
        registry
    }

    /// Adds or replaces the constructor for `kind`.
    pub fn register<F>(&mut self, kind: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(&DriverSettings<'_>) -> Result<Arc<dyn Driver>, ConfigurationError>
            + Send
            + Sync
            + 'static,
    {
        self.constructors.insert(kind.into(), Box::new(constructor));
        self
    }

    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Builds one driver. Unknown types yield `Ok(None)`.
    pub fn build(
        &self,
        spec: &DriverSpec,
        default_level: Severity,
    ) -> Result<Option<Arc<dyn Driver>>, ConfigurationError> {
        let Some(constructor) = self.constructors.get(&spec.kind) else {
            return Ok(None);
        };

        let settings = DriverSettings::new(&spec.kind, &spec.settings, default_level);
        constructor(&settings).map(Some)
    }

    /// Builds a dispatcher from a configuration document.
    ///
    /// Unknown driver types are skipped. The first driver that fails to build
    /// aborts initialization.
    pub fn initialize(&self, config: &Config) -> Result<Dispatcher, ConfigurationError> {
        let level = config.level()?;
        let dispatcher = Dispatcher::builder().with_threshold(level).build();

        for spec in &config.drivers {
            match self.build(spec, level)? {
                Some(driver) => {
                    log::debug!("registered `{}` driver", spec.kind);
                    dispatcher.add_shared_driver(driver);
                }
                None => log::warn!("ignoring unknown driver type `{}`", spec.kind),
            }
        }

        Ok(dispatcher)
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}
