//! Shared fixtures for the dapsql integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use tempfile::TempDir;

use dapsql::{
    BaseType, ModelNode, NodeKind, Value,
    session::{close_pool, session_scope},
};

/// A file-backed SQLite store seeded with three fruits.
///
/// The pool for the store is closed when the fixture is dropped.
pub struct FruitStore {
    _dir: TempDir,
    dsn: String,
}

impl FruitStore {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let dsn = format!("sqlite://{}?mode=rwc", dir.path().join("fruits.db").display());

        session_scope(&dsn, |session| -> Result<(), sqlx::Error> {
            session.execute("CREATE TABLE fruits (id INTEGER PRIMARY KEY, name TEXT NOT NULL)")?;
            session.execute(
                "INSERT INTO fruits (id, name) VALUES (1, 'cherimoya'), (2, 'durian'), (3, 'medlar')",
            )?;
            Ok(())
        })
        .expect("Failed to seed fruits");

        Self { _dir: dir, dsn }
    }

    pub fn dsn(&self) -> &str {
        &self.dsn
    }
}

impl Drop for FruitStore {
    fn drop(&mut self) {
        close_pool(&self.dsn);
    }
}

pub fn fruit(id: i64, name: &str) -> Value {
    [("id", Value::from(id)), ("name", Value::from(name))]
        .into_iter()
        .collect()
}

pub fn expected_fruits() -> Vec<Value> {
    vec![
        fruit(1, "cherimoya"),
        fruit(2, "durian"),
        fruit(3, "medlar"),
    ]
}

pub fn attributes(prefix: &str, count: usize) -> Value {
    (1..=count)
        .map(|i| (format!("{prefix}{i}"), format!("{prefix}{i}_value")))
        .collect()
}

/// YAML for the `dataset_name` / `sequence_name` dataset, with or without
/// attributes on every node.
pub fn dataset_yaml(with_attributes: bool) -> String {
    let attrs = |prefix: &str, count: usize| {
        if !with_attributes {
            return "~".to_string();
        }
        let pairs: Vec<String> = (1..=count)
            .map(|i| format!("{prefix}{i}: {prefix}{i}_value"))
            .collect();
        format!("{{{}}}", pairs.join(", "))
    };
    format!(
        r#"
database: ~
dataset:
  dataset_name:
    type: Dataset
    attributes: {ds}
    children:
      sequence_name:
        type: Sequence
        attributes: {seq}
        children:
          a: {{type: String, attributes: {a}}}
          b: {{type: Float32, attributes: {b}}}
          c: {{type: Float32, attributes: {c}}}
"#,
        ds = attrs("ds", 1),
        seq = attrs("seq", 2),
        a = attrs("a", 2),
        b = attrs("b", 2),
        c = attrs("c", 2),
    )
}

/// The model `dataset_yaml` compiles to.
pub fn make_model(with_attributes: bool) -> ModelNode {
    let maybe = |prefix: &str, count: usize| {
        if with_attributes {
            attributes(prefix, count).as_mapping().cloned().unwrap_or_default()
        } else {
            Default::default()
        }
    };

    let mut sequence =
        ModelNode::new("sequence_name", NodeKind::Sequence).with_attributes(maybe("seq", 2));
    for (name, base) in [
        ("a", BaseType::String),
        ("b", BaseType::Float32),
        ("c", BaseType::Float32),
    ] {
        sequence.insert_child(
            name,
            ModelNode::new(name, NodeKind::Base(base)).with_attributes(maybe(name, 2)),
        );
    }

    let mut model =
        ModelNode::new("dataset_name", NodeKind::Dataset).with_attributes(maybe("ds", 1));
    model.insert_child("sequence_name", sequence);
    model
}

/// Write `contents` to a config file inside a fresh temp directory.
pub fn write_config(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let path = dir.path().join("dataset.yaml");
    std::fs::write(&path, contents).expect("Failed to write config file");
    (dir, path)
}
