//! Name-based lookup over parameters owned by a record

use crate::error::{LinkError, LinkResult};
use crate::parameter::Parameter;
use std::collections::HashMap;

/// Borrowed index of parameters by name.
///
/// The collection never owns the parameters it indexes; it borrows them
/// from a record view for as long as it lives.
#[derive(Debug, Default)]
pub struct ParameterCollection<'a> {
    name: String,
    map: HashMap<String, &'a mut Parameter>,
}

impl<'a> ParameterCollection<'a> {
    /// Empty collection.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            map: HashMap::new(),
        }
    }

    /// Collection over every parameter of `params`.
    pub fn from_slice(name: impl Into<String>, params: &'a mut [Parameter]) -> Self {
        let mut collection = Self::new(name);
        for param in params {
            collection.add_parameter(param);
        }
        collection
    }

    /// Collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register `param` under its name.
    ///
    /// The first registration of a name wins; later ones are ignored.
    /// Unnamed parameters cannot be looked up and are skipped.
    pub fn add_parameter(&mut self, param: &'a mut Parameter) {
        if !param.has_name() {
            tracing::debug!("{}: skipping unnamed parameter", self.name);
            return;
        }
        let key = param.name().to_string();
        if self.map.contains_key(&key) {
            tracing::debug!("{}: parameter {:?} already registered", self.name, key);
            return;
        }
        self.map.insert(key, param);
    }

    /// Parameter registered as `name`.
    pub fn lookup(&self, name: &str) -> LinkResult<&Parameter> {
        self.map
            .get(name)
            .map(|p| &**p)
            .ok_or_else(|| LinkError::NotFound {
                name: name.to_string(),
            })
    }

    /// Mutable parameter registered as `name`.
    pub fn lookup_mut(&mut self, name: &str) -> LinkResult<&mut Parameter> {
        self.map
            .get_mut(name)
            .map(|p| &mut **p)
            .ok_or_else(|| LinkError::NotFound {
                name: name.to_string(),
            })
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Number of registered parameters.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Registered names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    /// True iff every registered parameter has been set.
    pub fn check_if_all_set(&self) -> bool {
        self.map.values().all(|p| p.is_set())
    }

    /// Clear the set flag of every registered parameter; values are kept.
    pub fn clear_all_set(&mut self) {
        for param in self.map.values_mut() {
            param.set_is_set(false);
        }
    }

    /// Forget every registration; the parameters themselves are untouched.
    pub fn clear_all_parameters(&mut self) {
        self.map.clear();
    }
}
