use std::fmt;

use crate::model::table::TableSet;

/// Value of a backend setting, escaped per type when rendered.
#[derive(Clone, Debug, PartialEq)]
pub enum SettingValue {
    /// Boolean setting, rendered as `'on'` / `'off'`.
    Bool(bool),
    /// Integer setting, rendered as a bare literal.
    Int(i64),
    /// Floating-point setting, rendered as a bare literal.
    Float(f64),
    /// Any other setting, rendered single-quoted.
    Text(String),
}

impl SettingValue {
    /// The Postgres-usable textual form of the value.
    ///
    /// This is not a hardened escape routine: nested quotes are not handled.
    /// The crate targets trusted research workloads, not hostile input.
    pub fn escaped(&self) -> String {
        match self {
            SettingValue::Bool(true) => "'on'".to_owned(),
            SettingValue::Bool(false) => "'off'".to_owned(),
            SettingValue::Int(value) => value.to_string(),
            SettingValue::Float(value) => value.to_string(),
            SettingValue::Text(value) => format!("'{value}'"),
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.escaped())
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Bool(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Int(value)
    }
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        SettingValue::Float(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Text(value.to_owned())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::Text(value)
    }
}

/// Plan parameters that steer the optimizer without picking operators.
///
/// All three maps keep insertion order, which is the order the corresponding
/// hints are emitted in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlanParameterization {
    cardinality_hints: Vec<(TableSet, u64)>,
    parallel_worker_hints: Vec<(TableSet, u32)>,
    system_specific_settings: Vec<(String, SettingValue)>,
}

impl PlanParameterization {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the cardinality estimate for the intermediate result
    /// spanning `tables`.
    pub fn add_cardinality_hint(&mut self, tables: TableSet, estimate: u64) {
        match self
            .cardinality_hints
            .iter_mut()
            .find(|(t, _)| *t == tables)
        {
            Some(entry) => entry.1 = estimate,
            None => self.cardinality_hints.push((tables, estimate)),
        }
    }

    /// Requests a number of parallel workers for scanning `tables`.
    pub fn add_parallel_worker_hint(&mut self, tables: TableSet, workers: u32) {
        match self
            .parallel_worker_hints
            .iter_mut()
            .find(|(t, _)| *t == tables)
        {
            Some(entry) => entry.1 = workers,
            None => self.parallel_worker_hints.push((tables, workers)),
        }
    }

    /// Sets an arbitrary backend setting for the duration of the query.
    pub fn set_system_setting(&mut self, key: impl Into<String>, value: impl Into<SettingValue>) {
        let key = key.into();
        match self
            .system_specific_settings
            .iter_mut()
            .find(|(k, _)| *k == key)
        {
            Some(entry) => entry.1 = value.into(),
            None => self.system_specific_settings.push((key, value.into())),
        }
    }

    /// Cardinality overrides in insertion order.
    pub fn cardinality_hints(&self) -> impl Iterator<Item = (&TableSet, u64)> {
        self.cardinality_hints.iter().map(|(t, e)| (t, *e))
    }

    /// Parallelism overrides in insertion order.
    pub fn parallel_worker_hints(&self) -> impl Iterator<Item = (&TableSet, u32)> {
        self.parallel_worker_hints.iter().map(|(t, w)| (t, *w))
    }

    /// System-specific settings in insertion order.
    pub fn system_specific_settings(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.system_specific_settings
            .iter()
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Whether the parameter set requests nothing at all.
    pub fn is_empty(&self) -> bool {
        self.cardinality_hints.is_empty()
            && self.parallel_worker_hints.is_empty()
            && self.system_specific_settings.is_empty()
    }
}
