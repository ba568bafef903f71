//! Active scenario overrides.

use tracing::debug;

use super::catalog::{ParamKey, ParamValue};
use crate::error::ScenarioError;

/// The active subset of the parameter catalogue.
///
/// Entries keep their activation order, which is the order labels are
/// reported in. Every stored value has passed [`ParamSpec::validate`].
///
/// [`ParamSpec::validate`]: super::catalog::ParamSpec::validate
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioRegistry {
    active: Vec<(ParamKey, ParamValue)>,
}

impl ScenarioRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activates `key` at its catalogue default.
    ///
    /// Returns `false` if it was already active (its value is kept).
    pub fn add(&mut self, key: ParamKey) -> bool {
        if self.is_active(key) {
            return false;
        }
        self.active.push((key, key.spec().default_value()));
        true
    }

    /// Deactivates `key`. Returns `false` if it was not active.
    pub fn remove(&mut self, key: ParamKey) -> bool {
        let before = self.active.len();
        self.active.retain(|(k, _)| *k != key);
        self.active.len() != before
    }

    /// Sets the value of an active parameter.
    ///
    /// Rejected values leave the registry unchanged.
    ///
    /// # Errors
    ///
    /// [`ScenarioError::NotActive`] if `key` has not been added, otherwise
    /// whatever [`ParamSpec::validate`](super::catalog::ParamSpec::validate)
    /// reports for `value`.
    pub fn update(&mut self, key: ParamKey, value: impl Into<ParamValue>) -> Result<(), ScenarioError> {
        let Some(slot) = self.active.iter_mut().find(|(k, _)| *k == key) else {
            return Err(ScenarioError::NotActive(key));
        };
        match key.spec().validate(value.into()) {
            Ok(v) => {
                slot.1 = v;
                Ok(())
            }
            Err(err) => {
                debug!(%key, %err, "scenario update rejected");
                Err(err)
            }
        }
    }

    pub fn is_active(&self, key: ParamKey) -> bool {
        self.active.iter().any(|(k, _)| *k == key)
    }

    /// Current value of `key`, or `None` when inactive.
    pub fn value_of(&self, key: ParamKey) -> Option<&ParamValue> {
        self.active.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Numeric value of `key`, or `fallback` when inactive or non-numeric.
    pub fn float_or(&self, key: ParamKey, fallback: f64) -> f64 {
        self.value_of(key).and_then(ParamValue::as_f64).unwrap_or(fallback)
    }

    pub fn bool_or(&self, key: ParamKey, fallback: bool) -> bool {
        self.value_of(key).and_then(ParamValue::as_bool).unwrap_or(fallback)
    }

    pub fn choice_or<'a>(&'a self, key: ParamKey, fallback: &'a str) -> &'a str {
        self.value_of(key).and_then(ParamValue::as_choice).unwrap_or(fallback)
    }

    /// String-keyed lookup for loosely typed callers. Unknown ids fall back.
    pub fn float_by_id(&self, id: &str, fallback: f64) -> f64 {
        id.parse::<ParamKey>()
            .map(|k| self.float_or(k, fallback))
            .unwrap_or(fallback)
    }

    /// Active entries in activation order.
    pub fn iter(&self) -> impl Iterator<Item = (ParamKey, &ParamValue)> {
        self.active.iter().map(|(k, v)| (*k, v))
    }

    /// Display labels of the active parameters.
    pub fn labels(&self) -> Vec<&'static str> {
        self.active.iter().map(|(k, _)| k.spec().label).collect()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }
}
