//! dapsql - declarative datasets served from relational stores.
//!
//! A configuration document declares a typed tree of named nodes (a DAP
//! dataset) with attributes and optional data bindings. This crate compiles
//! that document into a [`ModelNode`] tree for a data-serving layer and turns
//! each node's binding into a stream of rows pulled from the database.
//!
//! The pipeline:
//! - [`config`] reads the YAML document into a [`Value`].
//! - [`compile`] builds the model, resolving type names through a
//!   [`TypeRegistry`] and classifying `data` values into [`DataBinding`]s.
//! - [`resolver`] opens a [`RowStream`] for a binding, running queries inside
//!   a [`session::session_scope`] transaction.
//! - [`Handler`] holds the active configuration and model, and recompiles on
//!   update, optionally deep-merging the new document with [`merge::merge`]
//!   first.
//!
//! # Examples
//!
//! ```
//! use dapsql::{Handler, NodeKind, Value, config::parse_document};
//!
//! let config = parse_document(
//!     r#"
//! dataset:
//!   station:
//!     type: Dataset
//!     attributes: {station_name: FRASER}
//!     children:
//!       observations:
//!         type: Sequence
//!         data: [1, 2, 3]
//!         children:
//!           time: String
//!           max_temp: {type: Float32, attributes: {units: degrees_C}}
//! "#,
//! )
//! .unwrap();
//!
//! let handler = Handler::default();
//! handler.load(config).unwrap();
//!
//! let dataset = handler.dataset().unwrap();
//! assert_eq!(dataset.kind(), NodeKind::Dataset);
//! assert_eq!(dataset.find("observations").unwrap().kind(), NodeKind::Sequence);
//!
//! let rows: Vec<Value> = handler.rows("observations").unwrap().unwrap().collect();
//! assert_eq!(rows, vec![Value::from(1), Value::from(2), Value::from(3)]);
//! ```

pub mod binding;
pub mod compile;
pub mod config;
pub mod error;
pub mod handler;
pub mod merge;
pub mod model;
pub mod registry;
pub mod resolver;
pub mod session;
pub mod value;

pub use binding::{DataBinding, DataSource};
pub use config::DbConfig;
pub use error::{ConfigError, DapsqlError, ErrorCode, SpecError};
pub use handler::Handler;
pub use model::ModelNode;
pub use registry::{BaseType, NodeKind, TypeRegistry};
pub use resolver::RowStream;
pub use value::{Mapping, QueryFn, Value};
