//! Stage-1 output grammar.
//!
//! Accepted input, surrounded by optional whitespace:
//!
//! ```text
//! { KEY : STRING , KEY : STRING [,] }
//! ```
//!
//! where the keys are exactly `path` and `query` (any order, each once) and strings use single
//! or double quotes with backslash escapes. Anything else is rejected.

use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("not an action descriptor: {reason}")]
pub struct ActionParseError {
    pub reason: String,
}

fn reject(reason: impl Into<String>) -> ActionParseError {
    ActionParseError {
        reason: reason.into(),
    }
}

/// The API call chosen by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDescriptor {
    pub path: String,
    pub query: String,
}

impl ActionDescriptor {
    pub fn parse(text: &str) -> Result<Self, ActionParseError> {
        let mut chars = text.trim().chars().peekable();
        expect(&mut chars, '{')?;

        let mut path = None;
        let mut query = None;
        loop {
            skip_ws(&mut chars);
            if chars.peek() == Some(&'}') && (path.is_some() || query.is_some()) {
                chars.next();
                break;
            }
            let key = string_literal(&mut chars)?;
            expect(&mut chars, ':')?;
            let value = string_literal(&mut chars)?;
            let slot = match key.as_str() {
                "path" => &mut path,
                "query" => &mut query,
                other => return Err(reject(format!("unexpected key {other:?}"))),
            };
            if slot.replace(value).is_some() {
                return Err(reject(format!("duplicate key {key:?}")));
            }

            skip_ws(&mut chars);
            match chars.next() {
                Some(',') => continue,
                Some('}') => break,
                Some(c) => return Err(reject(format!("expected ',' or '}}', found {c:?}"))),
                None => return Err(reject("unterminated map")),
            }
        }

        skip_ws(&mut chars);
        if let Some(c) = chars.next() {
            return Err(reject(format!("trailing input starting at {c:?}")));
        }

        Ok(Self {
            path: path.ok_or_else(|| reject("missing key \"path\""))?,
            query: query.ok_or_else(|| reject("missing key \"query\""))?,
        })
    }
}

fn skip_ws(chars: &mut Peekable<Chars<'_>>) {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
}

fn expect(chars: &mut Peekable<Chars<'_>>, wanted: char) -> Result<(), ActionParseError> {
    skip_ws(chars);
    match chars.next() {
        Some(c) if c == wanted => Ok(()),
        Some(c) => Err(reject(format!("expected {wanted:?}, found {c:?}"))),
        None => Err(reject(format!("expected {wanted:?}, found end of input"))),
    }
}

fn string_literal(chars: &mut Peekable<Chars<'_>>) -> Result<String, ActionParseError> {
    skip_ws(chars);
    let quote = match chars.next() {
        Some(q @ ('\'' | '"')) => q,
        Some(c) => return Err(reject(format!("expected a quoted string, found {c:?}"))),
        None => return Err(reject("expected a quoted string, found end of input")),
    };
    let mut out = String::new();
    loop {
        match chars.next() {
            Some(c) if c == quote => return Ok(out),
            Some('\\') => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(c) => out.push(c),
                None => break,
            },
            Some(c) => out.push(c),
            None => break,
        }
    }
    Err(reject("unterminated string"))
}
