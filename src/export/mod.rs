//! # Compilers
//!
//! Two source-to-text transforms share the [`Compiler`] trait:
//!
//! - [`TsxCompiler`] backs the compile service. It takes a component written
//!   in TSX and returns plain JavaScript with JSX lowered to
//!   `React.createElement` calls, ready for the host's live preview.
//! - [`ReactExporter`] turns a slice of the host's project tree into the
//!   source of a React function component. The host sends the flattened node
//!   map plus the id of the element to export and receives JSX text.
//!
//! Compilers are plain values with no interior state. The compile worker
//! builds a fresh one for every request, so nothing leaks between calls.

mod tsx;

pub use tsx::TsxCompiler;

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Deserialize;
use serde_json::Value;

use crate::VectraError;

/// Anything that turns source text into output text.
pub trait Compiler {
    fn compile(&self, source: &str) -> Result<String, VectraError>;
}

/// Request body understood by [`ReactExporter`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSource {
    pub nodes: HashMap<String, ProjectNode>,
    pub root_id: String,
}

/// One element of the host's project tree.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectNode {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub props: NodeProps,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeProps {
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub layout_mode: Option<String>,
    #[serde(default)]
    pub icon_name: Option<String>,
    #[serde(default)]
    pub icon_size: Option<Value>,
}

const DEFAULT_COMPONENT_NAME: &str = "MyComponent";
const DEFAULT_ICON: &str = "Star";
const DEFAULT_ICON_SIZE: u64 = 24;
/// Deepest element nesting the exporter will render.
pub const MAX_EXPORT_DEPTH: usize = 256;

/// Emits a React function component for one subtree.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReactExporter;

impl Compiler for ReactExporter {
    fn compile(&self, source: &str) -> Result<String, VectraError> {
        let source: ExportSource = serde_json::from_str(source)?;
        self.export(&source.nodes, &source.root_id)
    }
}

impl ReactExporter {
    pub fn export(
        &self,
        nodes: &HashMap<String, ProjectNode>,
        root_id: &str,
    ) -> Result<String, VectraError> {
        let root = nodes
            .get(root_id)
            .ok_or_else(|| VectraError::Compile(format!("root node '{}' not found", root_id)))?;

        // A page exports its first child, not the page wrapper.
        let export_root = match root.children.first() {
            Some(first) if root.kind == "page" => first.as_str(),
            _ => root_id,
        };

        check_tree(nodes, export_root)?;

        let mut icons = BTreeSet::new();
        collect_icons(nodes, export_root, &mut icons);

        let mut code = String::from("import React from 'react';\n");
        if !icons.is_empty() {
            let list: Vec<&str> = icons.iter().map(String::as_str).collect();
            code.push_str(&format!(
                "import {{ {} }} from 'lucide-react';\n",
                list.join(", ")
            ));
        }

        let name = component_name(nodes.get(export_root));
        code.push_str(&format!(
            "\nexport default function {}() {{\n  return (\n",
            name
        ));
        code.push_str(&render_node(nodes, export_root, 2));
        code.push_str("  );\n}\n");

        tracing::debug!(root = export_root, icons = icons.len(), "component exported");
        Ok(code)
    }
}

fn component_name(node: Option<&ProjectNode>) -> String {
    let cleaned: String = node
        .and_then(|n| n.name.as_deref())
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    match cleaned.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => cleaned,
        _ => DEFAULT_COMPONENT_NAME.to_string(),
    }
}

/// Reject cycles and runaway nesting among the visible nodes under `root`.
fn check_tree(nodes: &HashMap<String, ProjectNode>, root: &str) -> Result<(), VectraError> {
    let mut on_path: HashSet<&str> = HashSet::new();
    let mut finished: HashSet<&str> = HashSet::new();
    // (id, depth, leaving)
    let mut stack: Vec<(&str, usize, bool)> = vec![(root, 0, false)];

    while let Some((id, depth, leaving)) = stack.pop() {
        if leaving {
            on_path.remove(id);
            finished.insert(id);
            continue;
        }
        if finished.contains(id) {
            continue;
        }
        let Some(node) = nodes.get(id) else {
            continue;
        };
        if node.hidden {
            continue;
        }
        if !on_path.insert(id) {
            return Err(VectraError::Compile(format!("cycle at '{}'", id)));
        }
        if depth >= MAX_EXPORT_DEPTH {
            return Err(VectraError::Compile(format!(
                "nesting deeper than {} at '{}'",
                MAX_EXPORT_DEPTH, id
            )));
        }
        stack.push((id, depth, true));
        stack.extend(node.children.iter().map(|c| (c.as_str(), depth + 1, false)));
    }
    Ok(())
}

fn collect_icons(nodes: &HashMap<String, ProjectNode>, id: &str, icons: &mut BTreeSet<String>) {
    let mut seen = HashSet::new();
    let mut stack = vec![id];
    while let Some(current) = stack.pop() {
        if !seen.insert(current) {
            continue;
        }
        let Some(node) = nodes.get(current) else {
            continue;
        };
        if node.hidden {
            continue;
        }
        if node.kind == "icon" {
            let icon = node.props.icon_name.as_deref().unwrap_or(DEFAULT_ICON);
            icons.insert(icon.to_string());
        }
        stack.extend(node.children.iter().map(String::as_str));
    }
}

fn html_tag(kind: &str) -> &'static str {
    match kind {
        "text" => "p",
        "heading" => "h1",
        "button" => "button",
        "image" => "img",
        "input" => "input",
        "canvas" | "webpage" => "main",
        _ => "div",
    }
}

fn class_attr(node: &ProjectNode) -> String {
    let mut classes = node.props.class_name.clone().unwrap_or_default();
    if node.props.layout_mode.as_deref() == Some("flex")
        && !classes.split_whitespace().any(|c| c == "flex")
    {
        classes.insert_str(0, "flex ");
    }
    let classes = classes.trim();
    if classes.is_empty() {
        String::new()
    } else {
        format!(" className=\"{}\"", classes)
    }
}

fn icon_size(node: &ProjectNode) -> u64 {
    match &node.props.icon_size {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(DEFAULT_ICON_SIZE),
        Some(Value::String(s)) => s.trim_end_matches("px").parse().unwrap_or(DEFAULT_ICON_SIZE),
        _ => DEFAULT_ICON_SIZE,
    }
}

/// Escape text for a JSX child position.
fn jsx_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '{' => out.push_str("{'{'}"),
            '}' => out.push_str("{'}'}"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_node(nodes: &HashMap<String, ProjectNode>, id: &str, indent: usize) -> String {
    let Some(node) = nodes.get(id) else {
        return String::new();
    };
    if node.hidden {
        return String::new();
    }

    let pad = "  ".repeat(indent);
    let attrs = class_attr(node);

    if node.kind == "icon" {
        let name = node.props.icon_name.as_deref().unwrap_or(DEFAULT_ICON);
        return format!("{}<{}{} size={{{}}} />\n", pad, name, attrs, icon_size(node));
    }

    let tag = html_tag(&node.kind);
    if tag == "img" || tag == "input" {
        return format!("{}<{}{} />\n", pad, tag, attrs);
    }

    let content = jsx_text(node.content.as_deref().unwrap_or(""));
    let children: String = node
        .children
        .iter()
        .map(|child| render_node(nodes, child, indent + 1))
        .collect();

    if children.is_empty() {
        if content.is_empty() {
            format!("{}<{}{} />\n", pad, tag, attrs)
        } else {
            format!("{}<{}{}>{}</{}>\n", pad, tag, attrs, content, tag)
        }
    } else {
        let mut body = String::new();
        if !content.is_empty() {
            body.push_str(&format!("{}  {}\n", pad, content));
        }
        body.push_str(&children);
        format!("{}<{}{}>\n{}{}</{}>\n", pad, tag, attrs, body, pad, tag)
    }
}
