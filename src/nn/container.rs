//! Container modules for composing neural networks.
//!
//! Containers prefix their children's parameter names, so a weight inside
//! the second layer of a [`Sequential`] is reported as `"1.weight"`.

use super::module::{prefixed, Module};
use crate::tensor::Tensor;

/// Sequential container for chaining modules.
///
/// Children are named by their position: `"0"`, `"1"`, ...
///
/// # Example
///
/// ```
/// use bitflip::nn::{Linear, Module, ReLU, Sequential};
///
/// let model = Sequential::new()
///     .add(Linear::with_seed(4, 8, Some(1)))
///     .add(ReLU::new())
///     .add(Linear::with_seed(8, 2, Some(2)));
///
/// let names: Vec<String> = model.named_parameters().into_iter().map(|(n, _)| n).collect();
/// assert_eq!(names, ["0.weight", "0.bias", "2.weight", "2.bias"]);
/// ```
pub struct Sequential {
    modules: Vec<Box<dyn Module>>,
}

impl Sequential {
    /// Create an empty Sequential container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Add a module to the sequence.
    #[allow(clippy::should_implement_trait)]
    #[must_use]
    pub fn add<M: Module + 'static>(mut self, module: M) -> Self {
        self.modules.push(Box::new(module));
        self
    }

    /// Add a module by boxed trait object.
    #[must_use]
    pub fn add_boxed(mut self, module: Box<dyn Module>) -> Self {
        self.modules.push(module);
        self
    }

    /// Get the number of modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if the container is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl Default for Sequential {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for Sequential {
    fn forward(&self, input: &Tensor) -> Tensor {
        self.modules
            .iter()
            .fold(input.clone(), |x, module| module.forward(&x))
    }

    fn named_parameters(&self) -> Vec<(String, &Tensor)> {
        self.modules
            .iter()
            .enumerate()
            .flat_map(|(i, m)| prefixed(&i.to_string(), m.named_parameters()))
            .collect()
    }

    fn named_parameters_mut(&mut self) -> Vec<(String, &mut Tensor)> {
        self.modules
            .iter_mut()
            .enumerate()
            .flat_map(|(i, m)| prefixed(&i.to_string(), m.named_parameters_mut()))
            .collect()
    }

    fn refresh_caches(&mut self) {
        for module in &mut self.modules {
            module.refresh_caches();
        }
    }
}

impl std::fmt::Debug for Sequential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequential")
            .field("num_modules", &self.modules.len())
            .finish()
    }
}

/// Named modules in insertion order.
///
/// `ModuleDict` has no forward pass of its own; calling
/// [`Module::forward`] returns the input unchanged. It exists to give
/// submodules stable names such as `"encoder.0.weight"`.
pub struct ModuleDict {
    modules: Vec<(String, Box<dyn Module>)>,
}

impl ModuleDict {
    /// Create an empty `ModuleDict`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Insert a module with the given name.
    ///
    /// If a module with the same name exists, it is replaced in place.
    #[must_use]
    pub fn insert<S: Into<String>, M: Module + 'static>(self, name: S, module: M) -> Self {
        self.insert_boxed(name, Box::new(module))
    }

    /// Insert a boxed module.
    #[must_use]
    pub fn insert_boxed<S: Into<String>>(mut self, name: S, module: Box<dyn Module>) -> Self {
        let name = name.into();
        match self.modules.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = module,
            None => self.modules.push((name, module)),
        }
        self
    }

    /// Get a module by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn Module> {
        self.modules
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, m)| m.as_ref())
    }

    /// Check if a module with the given name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Get the number of modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if the dictionary is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Get all module names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|(k, _)| k.as_str())
    }
}

impl Default for ModuleDict {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for ModuleDict {
    fn forward(&self, input: &Tensor) -> Tensor {
        input.clone()
    }

    fn named_parameters(&self) -> Vec<(String, &Tensor)> {
        self.modules
            .iter()
            .flat_map(|(k, m)| prefixed(k, m.named_parameters()))
            .collect()
    }

    fn named_parameters_mut(&mut self) -> Vec<(String, &mut Tensor)> {
        self.modules
            .iter_mut()
            .flat_map(|(k, m)| prefixed(k, m.named_parameters_mut()))
            .collect()
    }

    fn refresh_caches(&mut self) {
        for (_, module) in &mut self.modules {
            module.refresh_caches();
        }
    }
}

impl std::fmt::Debug for ModuleDict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<&str> = self.keys().collect();
        f.debug_struct("ModuleDict")
            .field("keys", &keys)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "container_tests.rs"]
mod tests;
