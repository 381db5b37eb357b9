//! Controllers: the property bags templates render against

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::value::Value;

type ControllerInit = dyn Fn(&mut Controller);

/// A registered controller factory
#[derive(Clone, Default)]
pub struct ControllerDefinition {
    pub properties: BTreeMap<String, Value>,
    pub query_params: Vec<String>,
    init: Option<Rc<ControllerInit>>,
}

impl ControllerDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a default property value
    pub fn property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Declare the ordered set of properties synced with the URL query string
    pub fn query_params<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query_params = names.into_iter().map(Into::into).collect();
        self
    }

    /// Run a hook once, when the controller singleton is created
    pub fn on_init(mut self, f: impl Fn(&mut Controller) + 'static) -> Self {
        self.init = Some(Rc::new(f));
        self
    }

    /// Create a controller instance and run its init hook
    pub fn instantiate(&self, name: &str) -> Controller {
        let mut controller = Controller {
            name: name.to_string(),
            properties: self.properties.clone(),
            defaults: self.properties.clone(),
            query_params: self.query_params.clone(),
        };
        if let Some(init) = &self.init {
            init(&mut controller);
        }
        controller
    }
}

impl fmt::Debug for ControllerDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerDefinition")
            .field("properties", &self.properties)
            .field("query_params", &self.query_params)
            .field("init", &self.init.is_some())
            .finish()
    }
}

/// A controller instance, one per name per engine instance
#[derive(Debug, Clone, PartialEq)]
pub struct Controller {
    name: String,
    properties: BTreeMap<String, Value>,
    defaults: BTreeMap<String, Value>,
    query_params: Vec<String>,
}

impl Controller {
    /// A controller for names with no registration
    pub fn generated(name: &str) -> Self {
        ControllerDefinition::new().instantiate(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Restore a property to its registered default
    pub fn reset(&mut self, key: &str) {
        match self.defaults.get(key) {
            Some(value) => {
                self.properties.insert(key.to_string(), value.clone());
            }
            None => {
                self.properties.remove(key);
            }
        }
    }

    pub fn query_params(&self) -> &[String] {
        &self.query_params
    }

    pub fn is_query_param(&self, key: &str) -> bool {
        self.query_params.iter().any(|qp| qp == key)
    }

    /// Query-param values that differ from their defaults, in declaration order
    pub fn changed_query_params(&self) -> Vec<(String, String)> {
        self.query_params
            .iter()
            .filter_map(|name| {
                let value = self.properties.get(name)?;
                if self.defaults.get(name) == Some(value) || value.is_null() {
                    return None;
                }
                Some((name.clone(), value.to_string()))
            })
            .collect()
    }

    /// The render context: every property as a map value
    pub fn context(&self) -> Value {
        Value::Map(self.properties.clone())
    }
}
