//! layered key-value store
//!
//! Values are stored raw and expanded on every read.
use crate::expression::{EvalError, Evaluator};
use crate::loader::{self, LoadError, Sources};
use crate::value::Value;
use indexmap::IndexMap;
use std::cell::Cell;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

const DEFAULTS: &str = include_str!("defaults.yml");

/// Built-in defaults, lowest precedence
pub fn builtin_defaults() -> IndexMap<String, Value> {
    loader::parse_document(DEFAULTS).expect("built-in defaults must be a valid yaml mapping")
}

#[derive(Debug)]
pub struct ValueStore {
    /// Values from documents, environment, overrides and [ValueStore::set]
    explicit: IndexMap<String, Value>,

    /// Built-in fallback values, never modified
    defaults: IndexMap<String, Value>,

    /// Identifiers handed out by the `uuid` directive, per namespace
    namespace_ids: Mutex<HashMap<String, String>>,
}

impl Default for ValueStore {
    fn default() -> Self {
        Self::with_defaults(builtin_defaults())
    }
}

impl ValueStore {
    /// Store without explicit values
    pub fn with_defaults(defaults: IndexMap<String, Value>) -> Self {
        Self {
            explicit: Default::default(),
            defaults,
            namespace_ids: Default::default(),
        }
    }

    /// Build a store from `sources` and the process environment
    pub fn load(sources: &Sources) -> Result<Self, LoadError> {
        Self::load_with_env(sources, loader::process_env())
    }

    /// Build a store from `sources` and the given environment variables
    pub fn load_with_env(
        sources: &Sources,
        env: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, LoadError> {
        let mut store = Self::default();
        store.explicit = loader::load(sources, env)?;
        Ok(store)
    }

    /// Expanded value for `key`
    ///
    /// Explicit values take precedence over built-in defaults.
    pub fn get(&self, key: &str) -> Result<Value, EvalError> {
        let references = Cell::new(0);
        Evaluator::new(self, 0, &references).get(key)
    }

    /// Stored value for `key` before expansion
    pub(crate) fn raw(&self, key: &str) -> Option<&Value> {
        self.explicit.get(key).or_else(|| self.defaults.get(key))
    }

    /// Expanded value for `key` in its string form
    pub fn get_string(&self, key: &str) -> Result<String, EvalError> {
        self.get(key).map(|value| value.to_string_form())
    }

    /// Store a raw value, `null` removes the key
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();

        if value.is_null() {
            self.delete(&key);
            return;
        }

        tracing::trace!(%key, ?value, "set");
        self.explicit.insert(key, value);
    }

    /// Remove an explicit value, built-in defaults stay visible
    pub fn delete(&mut self, key: &str) {
        if self.explicit.shift_remove(key).is_some() {
            tracing::trace!(%key, "deleted");
        }
    }

    /// Whether `key` has an explicit value
    ///
    /// Keys that only have a built-in default are not contained.
    pub fn contains(&self, key: &str) -> bool {
        self.explicit.contains_key(key)
    }

    /// All known keys, built-in defaults first
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.defaults
            .keys()
            .chain(
                self.explicit
                    .keys()
                    .filter(|key| !self.defaults.contains_key(*key)),
            )
            .map(String::as_str)
    }

    /// Expanded values of all known keys
    pub fn resolve_all(&self) -> Result<Value, EvalError> {
        self.keys()
            .map(|key| Ok((key.to_string(), self.get(key)?)))
            .collect::<Result<IndexMap<_, _>, EvalError>>()
            .map(Value::Object)
    }

    /// Resolve all placeholders in `input`
    pub fn evaluate(&self, input: &str) -> Result<String, EvalError> {
        let references = Cell::new(0);
        Evaluator::new(self, 0, &references).evaluate(input)
    }

    /// Evaluate every string inside `value`, other scalars are returned as-is
    pub fn expand(&self, value: &Value) -> Result<Value, EvalError> {
        let references = Cell::new(0);
        Evaluator::new(self, 0, &references).expand(value)
    }

    /// Identifier for a `uuid` namespace, generated on first use
    pub(crate) fn namespace_id(&self, namespace: &str) -> String {
        let mut ids = self
            .namespace_ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        ids.entry(namespace.to_string())
            .or_insert_with(|| {
                let id = uuid::Uuid::new_v4().to_string();
                tracing::debug!(%namespace, %id, "generated namespace identifier");
                id
            })
            .clone()
    }
}
