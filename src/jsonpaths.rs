//! JSONPaths mapping documents.
//!
//! A mapping document lists one path expression per target column, in column
//! order:
//!
//! ```json
//! {"jsonpaths": ["$['artist']", "$.auth", "$['firstName']"]}
//! ```
//!
//! Only the simple forms the warehouse `COPY` accepts are supported: the
//! root `$` followed by any mix of `.key`, `['key']`, `["key"]` and
//! `[index]`. Wildcards, slices and filters are rejected.

use serde::Deserialize;
use serde_json::Value;

/// One step of a path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// A parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    raw: String,
    segments: Vec<Segment>,
}

impl JsonPath {
    /// Parse a path expression such as `$['song']` or `$.a.b[0]`.
    pub fn parse(expr: &str) -> Result<Self, String> {
        let raw = expr.trim();
        let mut chars = raw.char_indices().peekable();
        match chars.next() {
            Some((_, '$')) => {}
            _ => return Err(format!("path '{raw}' must start with '$'")),
        }

        let mut segments = Vec::new();
        while let Some((pos, c)) = chars.next() {
            match c {
                '.' => {
                    let mut key = String::new();
                    while let Some(&(_, next)) = chars.peek() {
                        if next == '.' || next == '[' {
                            break;
                        }
                        key.push(next);
                        chars.next();
                    }
                    if key.is_empty() || key == "*" {
                        return Err(format!("path '{raw}' has an empty or wildcard key at {pos}"));
                    }
                    segments.push(Segment::Key(key));
                }
                '[' => {
                    let segment = match chars.peek() {
                        Some(&(_, quote @ ('\'' | '"'))) => {
                            chars.next();
                            let mut key = String::new();
                            let mut closed = false;
                            while let Some((_, ch)) = chars.next() {
                                match ch {
                                    '\\' => match chars.next() {
                                        Some((_, escaped)) => key.push(escaped),
                                        None => break,
                                    },
                                    ch if ch == quote => {
                                        closed = true;
                                        break;
                                    }
                                    ch => key.push(ch),
                                }
                            }
                            if !closed {
                                return Err(format!(
                                    "path '{raw}' has an unterminated string at {pos}"
                                ));
                            }
                            Segment::Key(key)
                        }
                        _ => {
                            let mut digits = String::new();
                            while let Some(&(_, ch)) = chars.peek() {
                                if ch == ']' {
                                    break;
                                }
                                digits.push(ch);
                                chars.next();
                            }
                            let index = digits.trim().parse::<usize>().map_err(|_| {
                                format!(
                                    "path '{raw}' has an invalid array index '{digits}' at {pos}"
                                )
                            })?;
                            Segment::Index(index)
                        }
                    };
                    match chars.next() {
                        Some((_, ']')) => segments.push(segment),
                        _ => {
                            return Err(format!(
                                "path '{raw}' is missing ']' after position {pos}"
                            ));
                        }
                    }
                }
                other => {
                    return Err(format!("path '{raw}' has unexpected '{other}' at {pos}"));
                }
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Resolve the path against a record. `None` when any step is missing.
    pub fn eval<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.segments.iter().try_fold(root, |current, segment| match segment {
            Segment::Key(key) => current.as_object()?.get(key),
            Segment::Index(i) => current.as_array()?.get(*i),
        })
    }
}

#[derive(Deserialize)]
struct JsonPathsDocument {
    jsonpaths: Vec<String>,
}

/// Parse a JSONPaths document into its ordered path expressions.
pub fn parse_document(text: &str) -> Result<Vec<JsonPath>, String> {
    let doc: JsonPathsDocument =
        serde_json::from_str(text).map_err(|e| format!("not a JSONPaths document: {e}"))?;
    if doc.jsonpaths.is_empty() {
        return Err("the jsonpaths array is empty".to_string());
    }
    doc.jsonpaths.iter().map(|p| JsonPath::parse(p)).collect()
}
