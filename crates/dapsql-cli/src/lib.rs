//! CLI logic for the dapsql configuration inspector.
//!
//! Loads a dataset configuration, prints the compiled model tree and,
//! on request, the rows behind every bound node.

mod args;

pub use args::Args;

use std::{fs, io};

use log::{debug, info};

use dapsql::{DapsqlError, Handler, ModelNode, Value, resolver};

/// Run the dapsql CLI application
///
/// # Errors
///
/// Returns `DapsqlError` for:
/// - Configuration read and parse errors
/// - Declaration errors in the dataset section
/// - Database errors while resolving bindings
/// - Failure to write the report
pub fn run(args: &Args) -> Result<(), DapsqlError> {
    info!(input_path = args.input, rows = args.rows; "Inspecting configuration");

    let handler = Handler::from_path(Some(&args.input))?;
    let Some(dataset) = handler.dataset() else {
        info!("Configuration declares no dataset");
        return emit(args, "(no dataset)\n");
    };

    let mut report = render_tree(&dataset);
    if args.rows {
        report.push('\n');
        report.push_str(&render_rows(&dataset)?);
    }

    emit(args, &report)
}

/// Render the model as an indented tree, one node per line followed by
/// its attributes.
pub fn render_tree(root: &ModelNode) -> String {
    let mut out = String::new();
    render_node(&mut out, root, 0);
    out
}

fn render_node(out: &mut String, node: &ModelNode, depth: usize) {
    let indent = "  ".repeat(depth);
    let bound = if node.data().is_some() { " [data]" } else { "" };
    out.push_str(&format!("{indent}{}: {}{bound}\n", node.name(), node.kind()));
    for (key, value) in node.attributes() {
        out.push_str(&format!("{indent}  @{key} = {value}\n"));
    }
    for child in node.children() {
        render_node(out, child, depth + 1);
    }
}

/// Resolve every bound node in tree order and render its rows.
///
/// # Errors
///
/// Returns the first resolution error unmodified.
pub fn render_rows(root: &ModelNode) -> Result<String, DapsqlError> {
    let mut out = String::new();
    for (path, node) in root.walk() {
        let Some(source) = node.data() else {
            continue;
        };
        let rows: Vec<Value> = resolver::open(source)?.collect();
        debug!(path, rows_count = rows.len(); "Binding resolved");

        out.push_str(&format!("{path} ({} rows)\n", rows.len()));
        for row in &rows {
            out.push_str(&format!("  {row}\n"));
        }
    }
    Ok(out)
}

fn emit(args: &Args, report: &str) -> Result<(), DapsqlError> {
    match &args.output {
        Some(path) => {
            fs::write(path, report)?;
            info!(output_file = path; "Report written");
        }
        None => io::Write::write_all(&mut io::stdout().lock(), report.as_bytes())?,
    }
    Ok(())
}
