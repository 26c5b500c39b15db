//! The handler owning the active configuration and compiled model.
//!
//! A [`Handler`] keeps the current configuration document and the dataset
//! model compiled from it. Updates recompile the whole model and swap it in;
//! readers hold an [`Arc`] to the tree they were given, so a swap never
//! disturbs a request already in flight.

use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use log::{info, warn};

use crate::{
    compile::dataset_model,
    config::load_document,
    error::DapsqlError,
    merge,
    model::ModelNode,
    registry::TypeRegistry,
    resolver::{self, RowStream},
    value::Value,
};

#[derive(Debug)]
struct State {
    config: Value,
    dataset: Option<Arc<ModelNode>>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            config: Value::empty_mapping(),
            dataset: None,
        }
    }
}

/// Holds the active configuration and its compiled dataset model.
///
/// Loads and updates are serialised: each one reads, merges, compiles and
/// swaps under a single lock.
///
/// # Examples
///
/// ```
/// use dapsql::{Handler, config::parse_document};
///
/// let handler = Handler::default();
/// assert!(handler.dataset().is_none());
///
/// let config = parse_document(
///     "dataset:\n  station:\n    type: Dataset\n    children:\n      time: String",
/// )
/// .unwrap();
/// handler.update(config, false).unwrap();
/// assert_eq!(handler.dataset().unwrap().name(), "station");
/// ```
#[derive(Debug, Default)]
pub struct Handler {
    registry: TypeRegistry,
    state: Mutex<State>,
}

impl Handler {
    /// Create a handler with an empty configuration and no model.
    pub fn new(registry: TypeRegistry) -> Self {
        Self {
            registry,
            state: Mutex::new(State::default()),
        }
    }

    /// Create a handler from an optional YAML configuration file.
    ///
    /// Without a path the handler starts empty, which is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`DapsqlError::Config`] if the file cannot be read or parsed,
    /// or any error of [`Handler::load`].
    pub fn from_path(path: Option<impl AsRef<Path>>) -> Result<Self, DapsqlError> {
        let handler = Self::default();
        if let Some(path) = path {
            let document = load_document(path)?;
            handler.load(document)?;
        }
        Ok(handler)
    }

    /// Compile `config` and install it as the active configuration.
    ///
    /// A null configuration counts as an empty one.
    ///
    /// # Errors
    ///
    /// Returns the configuration or declaration error. The previous
    /// configuration and model stay active in that case.
    pub fn load(&self, config: Value) -> Result<(), DapsqlError> {
        let config = or_empty(config);
        let mut state = self.lock();

        let dataset = match dataset_model(&config, &self.registry) {
            Ok(dataset) => dataset,
            Err(err) => {
                warn!(err:err; "Configuration load failed, keeping previous model");
                return Err(err);
            }
        };

        *state = State {
            config,
            dataset: dataset.map(Arc::new),
        };
        info!(has_dataset = state.dataset.is_some(); "Configuration loaded");
        Ok(())
    }

    /// Replace the configuration, or merge `config` into it when `merge` is
    /// set, then recompile the whole model.
    ///
    /// A null configuration counts as an empty one, so merging it changes
    /// nothing and replacing with it clears the model.
    ///
    /// # Errors
    ///
    /// Returns the configuration or declaration error. The previous
    /// configuration and model stay active in that case.
    pub fn update(&self, config: Value, merge: bool) -> Result<(), DapsqlError> {
        let config = or_empty(config);
        let mut state = self.lock();

        let config = if merge {
            merge::merge(&state.config, &config)
        } else {
            config
        };

        let dataset = match dataset_model(&config, &self.registry) {
            Ok(dataset) => dataset,
            Err(err) => {
                warn!(err:err, merge; "Update failed, keeping previous model");
                return Err(err);
            }
        };

        *state = State {
            config,
            dataset: dataset.map(Arc::new),
        };
        info!(has_dataset = state.dataset.is_some(), merge; "Configuration updated");
        Ok(())
    }

    /// A copy of the active configuration.
    pub fn config(&self) -> Value {
        self.lock().config.clone()
    }

    /// The active dataset model, if any.
    pub fn dataset(&self) -> Option<Arc<ModelNode>> {
        self.lock().dataset.clone()
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Open the stream of the node at `path`, a dotted path of child names
    /// below the dataset root.
    ///
    /// Returns `Ok(None)` if there is no model, no such node, or the node has
    /// no data binding.
    ///
    /// # Errors
    ///
    /// Returns [`DapsqlError::Database`] with the unmodified resolution error.
    pub fn rows(&self, path: &str) -> Result<Option<RowStream>, DapsqlError> {
        let Some(dataset) = self.dataset() else {
            return Ok(None);
        };
        let Some(source) = dataset.find(path).and_then(ModelNode::data) else {
            return Ok(None);
        };
        Ok(Some(resolver::open(source)?))
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn or_empty(config: Value) -> Value {
    if config.is_null() {
        Value::empty_mapping()
    } else {
        config
    }
}
