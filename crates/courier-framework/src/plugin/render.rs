//! `{{...}}` interpolation for plugin templates.
//!
//! Supported syntax:
//!
//! | Syntax | Meaning |
//! |--------|---------|
//! | `{{path.to.value}}` | value at a dotted path; `name[0]` indexes arrays |
//! | `{{.}}` | the current loop item, or the whole data outside loops |
//! | `{{#each item in path}}...{{/each}}` | repeat for every array element |
//! | `{{#if path}}...{{#else}}...{{/if}}` | branch on truthiness |
//!
//! A path that does not resolve is left in the output verbatim. Blocks may
//! nest.

use serde_json::Value;

use crate::error::{PluginError, PluginResult};

#[derive(Debug, Clone, PartialEq)]
enum Node<'t> {
    Text(&'t str),
    Var(&'t str),
    Each {
        item: &'t str,
        path: &'t str,
        body: Vec<Node<'t>>,
    },
    If {
        path: &'t str,
        then: Vec<Node<'t>>,
        otherwise: Vec<Node<'t>>,
    },
}

/// What ended a run of nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Close {
    Eof,
    Each,
    Else,
    If,
}

impl Close {
    fn describe(self) -> &'static str {
        match self {
            Self::Eof => "end of template",
            Self::Each => "{{/each}}",
            Self::Else => "{{#else}}",
            Self::If => "{{/if}}",
        }
    }
}

struct Parser<'t> {
    rest: &'t str,
}

impl<'t> Parser<'t> {
    fn parse(template: &'t str) -> PluginResult<Vec<Node<'t>>> {
        let mut parser = Parser { rest: template };
        match parser.nodes()? {
            (nodes, Close::Eof) => Ok(nodes),
            (_, close) => Err(unexpected(close)),
        }
    }

    fn nodes(&mut self) -> PluginResult<(Vec<Node<'t>>, Close)> {
        let mut nodes = Vec::new();
        loop {
            let rest = self.rest;
            let Some((start, tag, end)) = next_tag(rest) else {
                if !rest.is_empty() {
                    nodes.push(Node::Text(rest));
                }
                self.rest = "";
                return Ok((nodes, Close::Eof));
            };
            if start > 0 {
                nodes.push(Node::Text(&rest[..start]));
            }
            self.rest = &rest[end..];

            let trimmed = tag.trim();
            if let Some(args) = trimmed.strip_prefix("#each ") {
                let (item, path) = parse_each(args)?;
                let body = self.block(Close::Each)?;
                nodes.push(Node::Each { item, path, body });
            } else if let Some(path) = trimmed.strip_prefix("#if ") {
                let path = path.trim();
                if !is_expression(path) {
                    return Err(PluginError::Render(format!("invalid condition `{path}`")));
                }
                let (then, close) = self.nodes()?;
                let otherwise = match close {
                    Close::If => Vec::new(),
                    Close::Else => self.block(Close::If)?,
                    other => return Err(unexpected(other)),
                };
                nodes.push(Node::If {
                    path,
                    then,
                    otherwise,
                });
            } else {
                match trimmed {
                    "/each" => return Ok((nodes, Close::Each)),
                    "#else" => return Ok((nodes, Close::Else)),
                    "/if" => return Ok((nodes, Close::If)),
                    _ if is_expression(trimmed) => nodes.push(Node::Var(trimmed)),
                    _ => nodes.push(Node::Text(&rest[start..end])),
                }
            }
        }
    }

    /// Parses nodes up to the expected closing tag.
    fn block(&mut self, expected: Close) -> PluginResult<Vec<Node<'t>>> {
        let (nodes, close) = self.nodes()?;
        if close == expected {
            Ok(nodes)
        } else {
            Err(unexpected(close))
        }
    }
}

fn unexpected(close: Close) -> PluginError {
    PluginError::Render(format!("unexpected {}", close.describe()))
}

/// Finds the next `{{tag}}`, returning (start, tag body, end).
fn next_tag(s: &str) -> Option<(usize, &str, usize)> {
    let start = s.find("{{")?;
    let len = s[start + 2..].find("}}")?;
    let tag = &s[start + 2..start + 2 + len];
    Some((start, tag, start + 4 + len))
}

fn parse_each(args: &str) -> PluginResult<(&str, &str)> {
    let parts: Vec<&str> = args.split_whitespace().collect();
    match parts.as_slice() {
        [item, "in", path] if is_expression(path) => Ok((*item, *path)),
        _ => Err(PluginError::Render(format!(
            "invalid loop `{{{{#each {}}}}}`",
            args.trim()
        ))),
    }
}

fn is_expression(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'))
}

// =============================================================================
// Evaluation
// =============================================================================

struct Scope<'s> {
    root: &'s Value,
    bindings: Vec<(&'s str, &'s Value)>,
}

impl<'s> Scope<'s> {
    fn lookup(&self, expr: &str) -> Option<&'s Value> {
        if expr == "." {
            return Some(self.bindings.last().map_or(self.root, |(_, v)| *v));
        }

        let mut segments = expr.split('.');
        let first = segments.next()?;
        let (name, indices) = split_indices(first);
        let mut value = match self.bindings.iter().rev().find(|(n, _)| *n == name) {
            Some((_, bound)) => *bound,
            None if name.is_empty() => self.root,
            None => step(self.root, name)?,
        };
        value = index_all(value, indices)?;

        for segment in segments {
            let (name, indices) = split_indices(segment);
            if !name.is_empty() {
                value = step(value, name)?;
            }
            value = index_all(value, indices)?;
        }
        Some(value)
    }
}

/// Splits `name[1][2]` into `("name", "[1][2]")`.
fn split_indices(segment: &str) -> (&str, &str) {
    match segment.find('[') {
        Some(pos) => (&segment[..pos], &segment[pos..]),
        None => (segment, ""),
    }
}

fn index_all<'v>(mut value: &'v Value, indices: &str) -> Option<&'v Value> {
    for raw in indices.split('[').skip(1) {
        let idx = raw.strip_suffix(']')?;
        value = step(value, idx)?;
    }
    Some(value)
}

fn step<'v>(value: &'v Value, key: &str) -> Option<&'v Value> {
    match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

/// Text form of a value; strings are not quoted.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_nodes<'s>(
    nodes: &[Node<'s>],
    scope: &mut Scope<'s>,
    encode: bool,
    out: &mut String,
) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Var(expr) => match scope.lookup(expr) {
                Some(value) if encode => out.push_str(&encode_component(&display_value(value))),
                Some(value) => out.push_str(&display_value(value)),
                None => {
                    out.push_str("{{");
                    out.push_str(expr);
                    out.push_str("}}");
                }
            },
            Node::Each { item, path, body } => {
                if let Some(Value::Array(items)) = scope.lookup(path) {
                    for value in items {
                        scope.bindings.push((*item, value));
                        render_nodes(body, scope, encode, out);
                        scope.bindings.pop();
                    }
                }
            }
            Node::If {
                path,
                then,
                otherwise,
            } => {
                let branch = if truthy(scope.lookup(path)) {
                    then
                } else {
                    otherwise
                };
                render_nodes(branch, scope, encode, out);
            }
        }
    }
}

fn render(template: &str, data: &Value, encode: bool) -> PluginResult<String> {
    let nodes = Parser::parse(template)?;
    let mut scope = Scope {
        root: data,
        bindings: Vec::new(),
    };
    let mut out = String::with_capacity(template.len());
    render_nodes(&nodes, &mut scope, encode, &mut out);
    Ok(out)
}

/// Renders `template` against `data`.
pub fn interpolate(template: &str, data: &Value) -> PluginResult<String> {
    render(template, data, false)
}

/// Renders a URL template; substituted values are percent-encoded.
pub fn interpolate_url(template: &str, data: &Value) -> PluginResult<String> {
    render(template, data, true)
}

/// Interpolates every string inside `value`.
pub fn interpolate_value(value: &Value, data: &Value) -> PluginResult<Value> {
    Ok(match value {
        Value::String(s) => Value::String(interpolate(s, data)?),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| interpolate_value(v, data))
                .collect::<PluginResult<_>>()?,
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| Ok((k.clone(), interpolate_value(v, data)?)))
                .collect::<PluginResult<_>>()?,
        ),
        other => other.clone(),
    })
}

/// Percent-encodes every byte outside `A-Z a-z 0-9 - _ . ~`.
fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 2);
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => {
                out.push('%');
                out.push(HEX_UPPER[(byte >> 4) as usize] as char);
                out.push(HEX_UPPER[(byte & 0x0f) as usize] as char);
            }
        }
    }
    out
}

const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";
