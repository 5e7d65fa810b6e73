//! Defines `Evidence`, an observed partial assignment expressed with variable names and state
//! labels.

use indexmap::IndexMap;

use std::iter::FromIterator;

/// A partial assignment ```variable name -> state label```, kept in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Evidence {
    observations: IndexMap<String, String>
}

impl Evidence {

    /// No observations
    pub fn new() -> Self {
        Evidence { observations: IndexMap::new() }
    }

    /// Builder style `insert`
    pub fn observe(mut self, variable: &str, state: &str) -> Self {
        self.insert(variable, state);
        self
    }

    /// Record that `variable` was observed in `state`, replacing any previous observation of it
    pub fn insert(&mut self, variable: &str, state: &str) {
        self.observations.insert(String::from(variable), String::from(state));
    }

    pub fn get(&self, variable: &str) -> Option<&str> {
        self.observations.get(variable).map(|s| s.as_str())
    }

    pub fn contains(&self, variable: &str) -> bool {
        self.observations.contains_key(variable)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.observations.iter().map(|(v, s)| (v.as_str(), s.as_str()))
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Evidence {

    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Evidence {
            observations: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
        }
    }

}
