//! Evaluation of the store query language for local backends.
//!
//! Supports the subset drivex emits: clauses joined by `and`, each one of
//!
//! - `'<id>' in parents`
//! - `<field> <op> <value>` for `name`, `mimeType`, `trashed`, `starred`,
//!   `modifiedTime` (ops `=`, `!=`, `<`, `<=`, `>`, `>=`)
//! - `fullText contains '<text>'`
//! - `properties has { key='<k>' and value='<v>' }` (and `appProperties`)
//!
//! String literals use single quotes with `\'` and `\\` escapes.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use drivex_types::Node;

use crate::error::{StoreError, StoreResult};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Str(String),
    Word(String),
    Op(CompareOp),
    LBrace,
    RBrace,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn accepts(self, ord: Ordering) -> bool {
        match self {
            Self::Eq => ord == Ordering::Equal,
            Self::Ne => ord != Ordering::Equal,
            Self::Lt => ord == Ordering::Less,
            Self::Le => ord != Ordering::Greater,
            Self::Gt => ord == Ordering::Greater,
            Self::Ge => ord != Ordering::Less,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Literal {
    Text(String),
    Flag(bool),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertyMap {
    Properties,
    AppProperties,
}

/// One parsed predicate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Clause {
    InParents(String),
    Compare {
        field: String,
        op: CompareOp,
        value: Literal,
    },
    FullText(String),
    Has {
        map: PropertyMap,
        key: String,
        value: String,
    },
}

/// A parsed query: the conjunction of its clauses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    pub clauses: Vec<Clause>,
}

fn invalid(reason: impl Into<String>) -> StoreError {
    StoreError::Api {
        status: 400,
        message: format!("Invalid Value: {}", reason.into()),
    }
}

fn tokenize(input: &str) -> StoreResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '\'' => {
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some('\\') => match chars.next() {
                            Some(escaped) => s.push(escaped),
                            None => return Err(invalid("dangling escape")),
                        },
                        Some('\'') => break,
                        Some(other) => s.push(other),
                        None => return Err(invalid("unterminated string literal")),
                    }
                }
                tokens.push(Token::Str(s));
            }
            '{' => {
                chars.next();
                tokens.push(Token::LBrace);
            }
            '}' => {
                chars.next();
                tokens.push(Token::RBrace);
            }
            '=' => {
                chars.next();
                tokens.push(Token::Op(CompareOp::Eq));
            }
            '!' | '<' | '>' => {
                chars.next();
                let followed_by_eq = chars.peek() == Some(&'=');
                if followed_by_eq {
                    chars.next();
                }
                let op = match (c, followed_by_eq) {
                    ('!', true) => CompareOp::Ne,
                    ('<', false) => CompareOp::Lt,
                    ('<', true) => CompareOp::Le,
                    ('>', false) => CompareOp::Gt,
                    ('>', true) => CompareOp::Ge,
                    _ => return Err(invalid("stray '!'")),
                };
                tokens.push(Token::Op(op));
            }
            c if c.is_ascii_alphanumeric() || c == '_' => {
                let mut word = String::new();
                while let Some(&w) = chars.peek() {
                    if w.is_ascii_alphanumeric() || w == '_' {
                        word.push(w);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Word(word));
            }
            other => return Err(invalid(format!("unexpected character {other:?}"))),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn expect_word(&mut self, word: &str) -> StoreResult<()> {
        match self.next() {
            Some(Token::Word(w)) if w == word => Ok(()),
            other => Err(invalid(format!("expected {word:?}, found {other:?}"))),
        }
    }

    fn expect_str(&mut self) -> StoreResult<String> {
        match self.next() {
            Some(Token::Str(s)) => Ok(s),
            other => Err(invalid(format!("expected string literal, found {other:?}"))),
        }
    }

    fn expect_eq(&mut self) -> StoreResult<()> {
        match self.next() {
            Some(Token::Op(CompareOp::Eq)) => Ok(()),
            other => Err(invalid(format!("expected '=', found {other:?}"))),
        }
    }

    fn clause(&mut self) -> StoreResult<Clause> {
        match self.next() {
            Some(Token::Str(id)) => {
                self.expect_word("in")?;
                self.expect_word("parents")?;
                Ok(Clause::InParents(id))
            }
            Some(Token::Word(field)) => match self.next() {
                Some(Token::Word(w)) if w == "has" => {
                    let map = match field.as_str() {
                        "properties" => PropertyMap::Properties,
                        "appProperties" => PropertyMap::AppProperties,
                        _ => return Err(invalid(format!("{field} does not support 'has'"))),
                    };
                    match self.next() {
                        Some(Token::LBrace) => {}
                        other => return Err(invalid(format!("expected '{{', found {other:?}"))),
                    }
                    self.expect_word("key")?;
                    self.expect_eq()?;
                    let key = self.expect_str()?;
                    self.expect_word("and")?;
                    self.expect_word("value")?;
                    self.expect_eq()?;
                    let value = self.expect_str()?;
                    match self.next() {
                        Some(Token::RBrace) => Ok(Clause::Has { map, key, value }),
                        other => Err(invalid(format!("expected '}}', found {other:?}"))),
                    }
                }
                Some(Token::Word(w)) if w == "contains" => {
                    if field != "fullText" {
                        return Err(invalid(format!("{field} does not support 'contains'")));
                    }
                    Ok(Clause::FullText(self.expect_str()?))
                }
                Some(Token::Op(op)) => {
                    let value = match self.next() {
                        Some(Token::Str(s)) => Literal::Text(s),
                        Some(Token::Word(w)) if w == "true" => Literal::Flag(true),
                        Some(Token::Word(w)) if w == "false" => Literal::Flag(false),
                        other => return Err(invalid(format!("bad value {other:?}"))),
                    };
                    check_field(&field, op, &value)?;
                    Ok(Clause::Compare { field, op, value })
                }
                other => Err(invalid(format!("unexpected {other:?} after {field}"))),
            },
            other => Err(invalid(format!("unexpected {other:?}"))),
        }
    }
}

fn check_field(field: &str, op: CompareOp, value: &Literal) -> StoreResult<()> {
    let ok = match (field, value) {
        ("name" | "mimeType", Literal::Text(_)) => matches!(op, CompareOp::Eq | CompareOp::Ne),
        ("trashed" | "starred", Literal::Flag(_)) => matches!(op, CompareOp::Eq | CompareOp::Ne),
        ("modifiedTime", Literal::Text(t)) => DateTime::parse_from_rfc3339(t).is_ok(),
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(invalid(format!("unsupported comparison on {field}")))
    }
}

impl Query {
    pub fn parse(input: &str) -> StoreResult<Self> {
        let mut parser = Parser {
            tokens: tokenize(input)?,
            pos: 0,
        };
        let mut clauses = Vec::new();
        if parser.peek().is_none() {
            return Ok(Self { clauses });
        }
        loop {
            clauses.push(parser.clause()?);
            match parser.next() {
                None => break,
                Some(Token::Word(w)) if w == "and" => continue,
                Some(other) => return Err(invalid(format!("expected 'and', found {other:?}"))),
            }
        }
        Ok(Self { clauses })
    }

    /// Whether `node` (with content `body`) satisfies every clause.
    pub fn matches(&self, node: &Node, body: &[u8]) -> bool {
        self.clauses.iter().all(|c| clause_matches(c, node, body))
    }
}

fn clause_matches(clause: &Clause, node: &Node, body: &[u8]) -> bool {
    match clause {
        Clause::InParents(id) => node.has_parent(id),
        Clause::FullText(text) => {
            node.name.contains(text.as_str()) || String::from_utf8_lossy(body).contains(text.as_str())
        }
        Clause::Has { map, key, value } => {
            let props = match map {
                PropertyMap::Properties => &node.properties,
                PropertyMap::AppProperties => &node.app_properties,
            };
            props.get(key) == Some(value)
        }
        Clause::Compare { field, op, value } => match (field.as_str(), value) {
            ("name", Literal::Text(v)) => op.accepts(node.name.as_str().cmp(v.as_str())),
            ("mimeType", Literal::Text(v)) => op.accepts(node.mime_type.as_str().cmp(v.as_str())),
            ("trashed", Literal::Flag(v)) => op.accepts(node.trashed.cmp(v)),
            ("starred", Literal::Flag(v)) => op.accepts(node.starred.cmp(v)),
            ("modifiedTime", Literal::Text(v)) => {
                match (node.modified_time, DateTime::parse_from_rfc3339(v)) {
                    (Some(t), Ok(bound)) => op.accepts(t.cmp(&bound.with_timezone(&Utc))),
                    _ => false,
                }
            }
            _ => false,
        },
    }
}

/// Sort nodes by a comma-separated order spec such as
/// `folder,name,modifiedTime desc`.
///
/// `folder` puts folders first.
pub fn sort_nodes(nodes: &mut [Node], order_by: &str) -> StoreResult<()> {
    let mut keys = Vec::new();
    for part in order_by.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let mut words = part.split_whitespace();
        let key = words.next().unwrap_or_default();
        let desc = match words.next() {
            None => false,
            Some("desc") => true,
            Some("asc") => false,
            Some(other) => return Err(invalid(format!("bad sort direction {other:?}"))),
        };
        if !matches!(key, "folder" | "name" | "modifiedTime") {
            return Err(invalid(format!("unsupported sort key {key:?}")));
        }
        keys.push((key.to_string(), desc));
    }
    nodes.sort_by(|a, b| {
        for (key, desc) in &keys {
            let ord = match key.as_str() {
                "folder" => b.is_folder().cmp(&a.is_folder()),
                "name" => a.name.cmp(&b.name),
                _ => a.modified_time.cmp(&b.modified_time),
            };
            let ord = if *desc { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
    Ok(())
}
