//! Compilation of dataset declarations into a [`ModelNode`] tree.
//!
//! A declaration is either a bare type name or a mapping:
//!
//! ```yaml
//! observations:
//!   type: Sequence
//!   attributes: {source: crmp}
//!   data: SQL{{ SELECT * FROM observations }}
//!   children:
//!     time: String
//!     temp: {type: Float32, attributes: {units: degrees_C}}
//! ```
//!
//! Attributes pass through uninterpreted and a `data` value is classified into
//! a [`DataBinding`] without touching the database. Any error aborts the whole
//! pass; no partial tree is returned.

use log::{debug, trace};

use crate::{
    binding::{DataBinding, DataSource},
    config::DbConfig,
    error::{ConfigError, DapsqlError, SpecError},
    model::ModelNode,
    registry::{NodeKind, TypeRegistry},
    value::{Mapping, Value},
};

/// Compile a single declaration named `name`, recursing into its children.
///
/// # Errors
///
/// Returns [`SpecError`] if this declaration or any declaration below it is
/// neither a string nor a mapping, lacks `type`, or has non-mapping
/// `attributes` or `children`.
pub fn compile(
    name: &str,
    declaration: &Value,
    db: Option<&DbConfig>,
    registry: &TypeRegistry,
) -> Result<ModelNode, SpecError> {
    compile_at(name, name, declaration, db, registry)
}

fn compile_at(
    name: &str,
    path: &str,
    declaration: &Value,
    db: Option<&DbConfig>,
    registry: &TypeRegistry,
) -> Result<ModelNode, SpecError> {
    let map = match declaration {
        // Bare type name
        Value::String(type_name) => {
            let kind = registry.lookup(type_name);
            trace!(path, kind:%; "Compiled leaf declaration");
            return Ok(ModelNode::new(name, kind));
        }
        Value::Mapping(map) => map,
        other => {
            return Err(SpecError::InvalidDeclaration {
                path: path.to_string(),
                found: other.kind_name(),
            });
        }
    };

    let kind = match map.get("type") {
        None | Some(Value::Null) => {
            return Err(SpecError::MissingType {
                path: path.to_string(),
            });
        }
        Some(Value::String(type_name)) => registry.lookup(type_name),
        Some(other) => registry.lookup(&other.to_string()),
    };

    let attributes = match map.get("attributes") {
        None | Some(Value::Null) => Mapping::new(),
        Some(Value::Mapping(attributes)) => attributes.clone(),
        Some(other) => {
            return Err(SpecError::InvalidAttributes {
                path: path.to_string(),
                found: other.kind_name(),
            });
        }
    };

    let mut node = ModelNode::new(name, kind).with_attributes(attributes);

    match map.get("children") {
        None | Some(Value::Null) => {}
        Some(Value::Mapping(children)) => {
            for (child_name, child_declaration) in children {
                let child_path = format!("{path}.{child_name}");
                let child = compile_at(child_name, &child_path, child_declaration, db, registry)?;
                node.insert_child(child_name.as_str(), child);
            }
        }
        Some(other) => {
            return Err(SpecError::InvalidChildren {
                path: path.to_string(),
                found: other.kind_name(),
            });
        }
    }

    if let Some(raw) = map.get("data") {
        let binding = DataBinding::classify(raw);
        trace!(path, binding:?; "Attached data binding");
        node = node.with_data(DataSource::new(binding, db.cloned()));
    }

    debug!(
        path,
        kind:%,
        children_count = node.children_count();
        "Compiled declaration"
    );
    Ok(node)
}

/// Compile the dataset declared by a full configuration document.
///
/// A document without a `dataset` section (or with a null one) has no model
/// and yields `Ok(None)`. Otherwise the section must hold exactly one
/// `name: declaration` pair whose declaration is a mapping of type
/// [`NodeKind::Dataset`]. The document's `database` section, if any, is
/// attached to every bound node.
///
/// # Errors
///
/// Returns [`DapsqlError::Config`] for a malformed document or dataset root and
/// [`DapsqlError::Spec`] for a malformed declaration below the root.
pub fn dataset_model(
    document: &Value,
    registry: &TypeRegistry,
) -> Result<Option<ModelNode>, DapsqlError> {
    if !matches!(document, Value::Mapping(_) | Value::Null) {
        return Err(ConfigError::NotAMapping(document.kind_name()).into());
    }

    let spec = match document.get("dataset") {
        None | Some(Value::Null) => {
            debug!("Configuration declares no dataset");
            return Ok(None);
        }
        Some(spec) => spec,
    };

    let roots = spec
        .as_mapping()
        .ok_or_else(|| ConfigError::DatasetNotAMapping(spec.kind_name()))?;
    if roots.len() != 1 {
        return Err(ConfigError::DatasetRootCount(roots.len()).into());
    }
    let Some((name, declaration)) = roots.first() else {
        return Err(ConfigError::DatasetRootCount(0).into());
    };

    let is_dataset = declaration
        .get("type")
        .and_then(Value::as_str)
        .is_some_and(|type_name| registry.lookup(type_name) == NodeKind::Dataset);
    if !is_dataset {
        return Err(ConfigError::DatasetRootType { name: name.clone() }.into());
    }

    let db = DbConfig::from_document(document)?;
    let model = compile(name, declaration, db.as_ref(), registry)?;
    Ok(Some(model))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::parse_document,
        error::ErrorCode,
        registry::BaseType,
        value::QueryFn,
    };

    fn attributes(prefix: &str, count: usize) -> Value {
        (1..=count)
            .map(|i| (format!("{prefix}{i}"), format!("{prefix}{i}_value")))
            .collect()
    }

    fn dataset_declaration(with_attributes: bool) -> Value {
        let maybe = |prefix: &str, count: usize| {
            if with_attributes {
                attributes(prefix, count)
            } else {
                Value::Null
            }
        };
        let leaf = |type_name: &str, prefix: &str| -> Value {
            [
                ("type", Value::from(type_name)),
                ("attributes", maybe(prefix, 2)),
            ]
            .into_iter()
            .collect()
        };
        let children: Value = [
            ("a", leaf("String", "a")),
            ("b", leaf("Float32", "b")),
            ("c", leaf("Float32", "c")),
        ]
        .into_iter()
        .collect();
        let sequence: Value = [
            ("type", Value::from("Sequence")),
            ("attributes", maybe("seq", 2)),
            ("children", children),
        ]
        .into_iter()
        .collect();
        [
            ("type", Value::from("Dataset")),
            ("attributes", maybe("ds", 1)),
            ("children", [("sequence_name", sequence)].into_iter().collect()),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_structural_round_trip() {
        let registry = TypeRegistry::new();
        let model = compile("dataset_name", &dataset_declaration(false), None, &registry).unwrap();

        assert_eq!(model.name(), "dataset_name");
        assert_eq!(model.kind(), NodeKind::Dataset);
        assert!(model.attributes().is_empty());
        assert_eq!(model.children_count(), 1);

        let sequence = model.child("sequence_name").unwrap();
        assert_eq!(sequence.name(), "sequence_name");
        assert_eq!(sequence.kind(), NodeKind::Sequence);
        assert!(sequence.attributes().is_empty());

        let leaves: Vec<(&str, NodeKind)> = sequence
            .children()
            .map(|leaf| (leaf.name(), leaf.kind()))
            .collect();
        assert_eq!(
            leaves,
            vec![
                ("a", NodeKind::Base(BaseType::String)),
                ("b", NodeKind::Base(BaseType::Float32)),
                ("c", NodeKind::Base(BaseType::Float32)),
            ]
        );
        assert!(sequence.children().all(|leaf| leaf.attributes().is_empty()));
        assert!(model.walk().iter().all(|(_, node)| node.data().is_none()));
    }

    #[test]
    fn test_attribute_fidelity() {
        let registry = TypeRegistry::new();
        let model = compile("dataset_name", &dataset_declaration(true), None, &registry).unwrap();

        let expect = |prefix: &str, count: usize| attributes(prefix, count).as_mapping().cloned();
        assert_eq!(Some(model.attributes().clone()), expect("ds", 1));

        let sequence = model.child("sequence_name").unwrap();
        assert_eq!(Some(sequence.attributes().clone()), expect("seq", 2));
        for name in ["a", "b", "c"] {
            let leaf = sequence.child(name).unwrap();
            assert_eq!(Some(leaf.attributes().clone()), expect(name, 2));
        }
    }

    #[test]
    fn test_bare_type_name_declaration() {
        let registry = TypeRegistry::new();
        let node = compile("time", &Value::from("String"), None, &registry).unwrap();
        assert_eq!(node.kind(), NodeKind::Base(BaseType::String));
        assert!(node.attributes().is_empty());
        assert_eq!(node.children_count(), 0);

        let node = compile("mystery", &Value::from("Quaternion"), None, &registry).unwrap();
        assert_eq!(node.kind(), NodeKind::Base(BaseType::Untyped));
    }

    #[test]
    fn test_kind_ignores_children() {
        let registry = TypeRegistry::new();
        let declaration: Value = [
            ("type", Value::from("Float64")),
            ("children", [("x", "Int32")].into_iter().collect()),
        ]
        .into_iter()
        .collect();
        let node = compile("weird", &declaration, None, &registry).unwrap();
        assert_eq!(node.kind(), NodeKind::Base(BaseType::Float64));
        assert_eq!(node.children_count(), 1);
    }

    #[test]
    fn test_missing_type_at_nested_position() {
        let registry = TypeRegistry::new();
        let doc = parse_document(
            r#"
dataset_name:
  type: Dataset
  children:
    sequence_name:
      type: Sequence
      children:
        a: String
        b:
          attributes: {units: mm}
"#,
        )
        .unwrap();
        let declaration = doc.get("dataset_name").unwrap();

        let err = compile("dataset_name", declaration, None, &registry).unwrap_err();
        assert_eq!(err.code(), ErrorCode::E201);
        assert_eq!(err.path(), "dataset_name.sequence_name.b");
    }

    #[test]
    fn test_invalid_declaration() {
        let registry = TypeRegistry::new();
        let declaration: Value = [
            ("type", Value::from("Dataset")),
            ("children", [("bad", Value::from(42))].into_iter().collect()),
        ]
        .into_iter()
        .collect();

        let err = compile("root", &declaration, None, &registry).unwrap_err();
        assert!(matches!(
            err,
            SpecError::InvalidDeclaration { ref path, found: "integer" } if path == "root.bad"
        ));
    }

    #[test]
    fn test_invalid_attributes_and_children() {
        let registry = TypeRegistry::new();
        let declaration: Value = [
            ("type", Value::from("Sequence")),
            ("attributes", Value::from(vec!["a", "b"])),
        ]
        .into_iter()
        .collect();
        let err = compile("s", &declaration, None, &registry).unwrap_err();
        assert_eq!(err.code(), ErrorCode::E202);

        let declaration: Value = [
            ("type", Value::from("Sequence")),
            ("children", Value::from("a")),
        ]
        .into_iter()
        .collect();
        let err = compile("s", &declaration, None, &registry).unwrap_err();
        assert_eq!(err.code(), ErrorCode::E203);
    }

    #[test]
    fn test_data_is_classified_and_carries_db() {
        let registry = TypeRegistry::new();
        let db = DbConfig::new("sqlite://fruits.db");
        let query = QueryFn::new(|_| Ok(Vec::new()));
        let children: Value = [
            (
                "sql",
                [
                    ("type", Value::from("Sequence")),
                    ("data", Value::from("SQL{{ SELECT * FROM fruits }}")),
                ]
                .into_iter()
                .collect::<Value>(),
            ),
            (
                "callable",
                [
                    ("type", Value::from("Sequence")),
                    ("data", Value::from(query.clone())),
                ]
                .into_iter()
                .collect(),
            ),
            (
                "constant",
                [("type", Value::from("Int32")), ("data", Value::from(99))]
                    .into_iter()
                    .collect(),
            ),
        ]
        .into_iter()
        .collect();
        let declaration: Value = [("type", Value::from("Dataset")), ("children", children)]
            .into_iter()
            .collect();

        let model = compile("root", &declaration, Some(&db), &registry).unwrap();
        assert!(model.data().is_none());

        let sql = model.child("sql").unwrap().data().unwrap();
        assert_eq!(
            sql.binding(),
            &DataBinding::QueryText("SELECT * FROM fruits".to_string())
        );
        assert_eq!(sql.db(), Some(&db));

        let callable = model.child("callable").unwrap().data().unwrap();
        assert_eq!(callable.binding(), &DataBinding::Callable(query));

        // Bindings are not restricted to stream-capable kinds
        let constant = model.child("constant").unwrap().data().unwrap();
        assert_eq!(constant.binding(), &DataBinding::Atomic(Value::from(99)));
    }

    #[test]
    fn test_dataset_model_from_document() {
        let registry = TypeRegistry::new();
        let doc = parse_document(
            r#"
database:
  dsn: sqlite://fruits.db
dataset:
  fruit_basket:
    type: Dataset
    attributes: {owner: me}
    children:
      fruits:
        type: Sequence
        data: SQL{{ SELECT * FROM fruits }}
        children:
          id: Int32
          name: String
"#,
        )
        .unwrap();

        let model = dataset_model(&doc, &registry).unwrap().unwrap();
        assert_eq!(model.name(), "fruit_basket");
        let fruits = model.child("fruits").unwrap();
        assert_eq!(
            fruits.data().and_then(|data| data.db()).map(DbConfig::dsn),
            Some("sqlite://fruits.db")
        );
        let names: Vec<&str> = fruits.children().map(ModelNode::name).collect();
        assert_eq!(names, vec!["id", "name"]);
    }

    #[test]
    fn test_dataset_model_empty_document() {
        let registry = TypeRegistry::new();
        assert!(dataset_model(&Value::empty_mapping(), &registry).unwrap().is_none());
        assert!(dataset_model(&Value::Null, &registry).unwrap().is_none());

        let doc = parse_document("database: ~\ndataset: ~").unwrap();
        assert!(dataset_model(&doc, &registry).unwrap().is_none());
    }

    #[test]
    fn test_dataset_model_root_count() {
        let registry = TypeRegistry::new();
        let doc = parse_document("dataset: {}").unwrap();
        assert!(matches!(
            dataset_model(&doc, &registry),
            Err(DapsqlError::Config(ConfigError::DatasetRootCount(0)))
        ));

        let doc = parse_document("dataset:\n  one: {type: Dataset}\n  two: {type: Dataset}").unwrap();
        assert!(matches!(
            dataset_model(&doc, &registry),
            Err(DapsqlError::Config(ConfigError::DatasetRootCount(2)))
        ));

        let doc = parse_document("dataset: [a, b]").unwrap();
        assert!(matches!(
            dataset_model(&doc, &registry),
            Err(DapsqlError::Config(ConfigError::DatasetNotAMapping("sequence")))
        ));
    }

    #[test]
    fn test_dataset_model_root_type() {
        let registry = TypeRegistry::new();
        for text in [
            "dataset:\n  root: {type: Sequence}",
            "dataset:\n  root: Dataset",
            "dataset:\n  root: {children: {a: String}}",
        ] {
            let doc = parse_document(text).unwrap();
            assert!(
                matches!(
                    dataset_model(&doc, &registry),
                    Err(DapsqlError::Config(ConfigError::DatasetRootType { ref name })) if name == "root"
                ),
                "expected root type error for {text:?}"
            );
        }
    }

    #[test]
    fn test_dataset_model_registry_alias_for_root() {
        let mut registry = TypeRegistry::new();
        registry.register("Collection", NodeKind::Dataset);
        let doc = parse_document("dataset:\n  root: {type: Collection}").unwrap();
        let model = dataset_model(&doc, &registry).unwrap().unwrap();
        assert_eq!(model.kind(), NodeKind::Dataset);
    }

    #[test]
    fn test_dataset_model_rejects_non_mapping_document() {
        let registry = TypeRegistry::new();
        assert!(matches!(
            dataset_model(&Value::from(3), &registry),
            Err(DapsqlError::Config(ConfigError::NotAMapping("integer")))
        ));
    }
}
