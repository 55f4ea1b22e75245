//! Path expressions over JSON trees
//!
//! A small JSONPath subset used for two things: locating the positions an
//! expansion rewrites, and locating the well-known fields of a response.
//!
//! ```text
//! $.body.query          child by name
//! $.body['a key']       child by quoted name
//! $.items[0] / [-1]     array index, negative counts from the end
//! $.items[*] / $.*      every child
//! $..query / $..[*]     every descendant matching the selector
//! ```

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::{RunnerError, RunnerResult};

/// What a single segment picks out of a node
#[derive(Debug, Clone, PartialEq)]
enum Selector {
    Name(String),
    Index(i64),
    Wildcard,
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    /// Direct children of the current node
    Child(Selector),
    /// The current node's children and all their descendants
    Descendant(Selector),
}

/// A parsed, validated path expression
#[derive(Debug, Clone, PartialEq)]
pub struct PathExpr {
    source: String,
    segments: Vec<Segment>,
}

impl PathExpr {
    /// Parse a path expression, failing with the offending byte position
    pub fn parse(source: &str) -> RunnerResult<Self> {
        let segments = Parser::new(source).parse()?;
        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Build `$.a.b.c` from plain field names without going through the parser
    pub fn field_chain(fields: &[&str]) -> Self {
        let mut source = String::from("$");
        let mut segments = Vec::with_capacity(fields.len());
        for field in fields {
            source.push('.');
            source.push_str(field);
            segments.push(Segment::Child(Selector::Name(field.to_string())));
        }
        Self { source, segments }
    }

    /// True when the path names at most one position: only name and index
    /// selectors, no wildcard and no descendant segment
    pub fn is_definite(&self) -> bool {
        self.segments.iter().all(|segment| {
            matches!(
                segment,
                Segment::Child(Selector::Name(_)) | Segment::Child(Selector::Index(_))
            )
        })
    }

    /// The expression as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// All positions matched in `root`, in document order
    pub fn select<'a>(&self, root: &'a Value) -> Vec<&'a Value> {
        let mut current = vec![root];

        for segment in &self.segments {
            let mut next = Vec::new();
            for node in current {
                match segment {
                    Segment::Child(selector) => selector.children(node, &mut next),
                    Segment::Descendant(selector) => descend(node, selector, &mut next),
                }
            }
            current = next;
        }

        current
    }

    /// First matched position, if any
    pub fn select_first<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.select(root).into_iter().next()
    }

    /// Visit every matched position in `root`, replacing it with whatever
    /// `rewrite` returns. `None` leaves the position untouched.
    ///
    /// Returns the number of positions matched.
    pub fn rewrite<F>(&self, root: &mut Value, rewrite: &mut F) -> usize
    where
        F: FnMut(&Value) -> Option<Value>,
    {
        rewrite_at(root, &self.segments, rewrite)
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for PathExpr {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PathExpr::parse(s)
    }
}

impl Selector {
    fn children<'a>(&self, node: &'a Value, out: &mut Vec<&'a Value>) {
        match (self, node) {
            (Selector::Name(name), Value::Object(map)) => out.extend(map.get(name)),
            (Selector::Index(index), Value::Array(items)) => {
                out.extend(resolve_index(*index, items.len()).map(|i| &items[i]))
            }
            (Selector::Wildcard, Value::Object(map)) => out.extend(map.values()),
            (Selector::Wildcard, Value::Array(items)) => out.extend(items.iter()),
            _ => {}
        }
    }

    fn children_mut<'a>(&self, node: &'a mut Value) -> Vec<&'a mut Value> {
        match self {
            Selector::Name(name) => match node {
                Value::Object(map) => map.get_mut(name).into_iter().collect(),
                _ => Vec::new(),
            },
            Selector::Index(index) => match node {
                Value::Array(items) => {
                    let len = items.len();
                    match resolve_index(*index, len) {
                        Some(i) => items.get_mut(i).into_iter().collect(),
                        None => Vec::new(),
                    }
                }
                _ => Vec::new(),
            },
            Selector::Wildcard => all_children_mut(node),
        }
    }
}

fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let resolved = if index < 0 {
        (len as i64).checked_add(index)?
    } else {
        index
    };
    usize::try_from(resolved).ok().filter(|i| *i < len)
}

fn all_children(node: &Value) -> Vec<&Value> {
    match node {
        Value::Object(map) => map.values().collect(),
        Value::Array(items) => items.iter().collect(),
        _ => Vec::new(),
    }
}

fn all_children_mut(node: &mut Value) -> Vec<&mut Value> {
    match node {
        Value::Object(map) => map.values_mut().collect(),
        Value::Array(items) => items.iter_mut().collect(),
        _ => Vec::new(),
    }
}

fn descend<'a>(node: &'a Value, selector: &Selector, out: &mut Vec<&'a Value>) {
    selector.children(node, out);
    for child in all_children(node) {
        descend(child, selector, out);
    }
}

fn rewrite_at<F>(node: &mut Value, segments: &[Segment], rewrite: &mut F) -> usize
where
    F: FnMut(&Value) -> Option<Value>,
{
    let Some((segment, rest)) = segments.split_first() else {
        if let Some(replacement) = rewrite(node) {
            *node = replacement;
        }
        return 1;
    };

    let mut matched = 0;
    match segment {
        Segment::Child(selector) => {
            for child in selector.children_mut(node) {
                matched += rewrite_at(child, rest, rewrite);
            }
        }
        Segment::Descendant(selector) => {
            for child in selector.children_mut(node) {
                matched += rewrite_at(child, rest, rewrite);
            }
            for child in all_children_mut(node) {
                matched += rewrite_at(child, segments, rewrite);
            }
        }
    }
    matched
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'$' || b >= 0x80
}

struct Parser<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    fn parse(mut self) -> RunnerResult<Vec<Segment>> {
        if !self.eat(b'$') {
            return Err(self.error("expected '$' at start of path"));
        }

        let mut segments = Vec::new();
        while let Some(b) = self.peek() {
            match b {
                b'.' => {
                    self.pos += 1;
                    if self.eat(b'.') {
                        let selector = if self.peek() == Some(b'[') {
                            self.bracket()?
                        } else {
                            self.dotted()?
                        };
                        segments.push(Segment::Descendant(selector));
                    } else {
                        segments.push(Segment::Child(self.dotted()?));
                    }
                }
                b'[' => segments.push(Segment::Child(self.bracket()?)),
                _ => return Err(self.error("expected '.' or '['")),
            }
        }

        Ok(segments)
    }

    fn peek(&self) -> Option<u8> {
        self.source.as_bytes().get(self.pos).copied()
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn dotted(&mut self) -> RunnerResult<Selector> {
        if self.eat(b'*') {
            return Ok(Selector::Wildcard);
        }

        let start = self.pos;
        while self.peek().is_some_and(is_name_byte) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected a field name"));
        }
        Ok(Selector::Name(self.source[start..self.pos].to_string()))
    }

    fn bracket(&mut self) -> RunnerResult<Selector> {
        // caller guarantees the '['
        self.pos += 1;

        let selector = match self.peek() {
            Some(b'*') => {
                self.pos += 1;
                Selector::Wildcard
            }
            Some(quote @ (b'\'' | b'"')) => {
                self.pos += 1;
                Selector::Name(self.quoted(quote)?)
            }
            Some(b) if b == b'-' || b.is_ascii_digit() => Selector::Index(self.integer()?),
            _ => return Err(self.error("expected '*', an index or a quoted name")),
        };

        if !self.eat(b']') {
            return Err(self.error("expected ']'"));
        }
        Ok(selector)
    }

    fn quoted(&mut self, quote: u8) -> RunnerResult<String> {
        let opening = self.pos - 1;
        let mut name = String::new();
        let mut chars = self.source[self.pos..].char_indices();

        while let Some((offset, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, escaped)) => name.push(escaped),
                    None => break,
                },
                c if c == quote as char => {
                    self.pos += offset + 1;
                    return Ok(name);
                }
                c => name.push(c),
            }
        }

        self.pos = opening;
        Err(self.error("unterminated quoted name"))
    }

    fn integer(&mut self) -> RunnerResult<i64> {
        let start = self.pos;
        self.eat(b'-');
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }

        match self.source[start..self.pos].parse::<i64>() {
            Ok(index) => Ok(index),
            Err(_) => {
                self.pos = start;
                Err(self.error("expected an integer index"))
            }
        }
    }

    fn error(&self, reason: &str) -> RunnerError {
        RunnerError::PathSyntax {
            path: self.source.to_string(),
            position: self.pos,
            reason: reason.to_string(),
        }
    }
}
