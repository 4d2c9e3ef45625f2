//! Filter text parser
//!
//! A single forward pass over the input. The scanner dispatches on the
//! current character (`(` group, `[` property) or on the `not (` and
//! `CurrentUser` prefixes, and never backtracks.

use crate::config::Culture;
use crate::criteria::ast::{ComparisonOperator, Criteria, FunctionType, IntervalType};
use crate::criteria::value::{parse_value, Value};
use crate::error::{FilterError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;
use tracing::debug;

static NOT_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^not\s\(").expect("valid pattern"));

static CURRENT_USER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^CurrentUser\b").expect("valid pattern"));

static ANY_PROPERTY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^([\w.]+?)\.Any\((.*)\)$").expect("valid pattern"));

/// Parse a filter text with the default culture
///
/// Returns `Ok(None)` for empty or whitespace-only input.
pub fn parse(text: &str) -> Result<Option<Criteria>> {
    Parser::new().parse(text)
}

/// Filter text parser configured with a culture for value literals
#[derive(Debug, Clone, Default)]
pub struct Parser {
    culture: Culture,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_culture(culture: Culture) -> Self {
        Self { culture }
    }

    pub fn culture(&self) -> &Culture {
        &self.culture
    }

    pub fn parse(&self, text: &str) -> Result<Option<Criteria>> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        debug!(len = text.len(), "parsing filter");
        let mut scanner = Scanner::new(text, 0, &self.culture);
        let criteria = scanner.parse_complete()?;
        debug!(criteria = %criteria, "parsed filter");
        Ok(Some(criteria))
    }
}

/// Cursor over a slice of the filter text
///
/// `offset` is the position of the slice within the full input so that
/// errors raised inside nested `Any` criteria report absolute positions.
struct Scanner<'a> {
    input: &'a str,
    pos: usize,
    offset: usize,
    culture: &'a Culture,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str, offset: usize, culture: &'a Culture) -> Self {
        Self {
            input,
            pos: 0,
            offset,
            culture,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn position(&self) -> usize {
        self.offset + self.pos
    }

    fn error(&self, message: &str) -> FilterError {
        let fragment: String = self.rest().chars().take(32).collect();
        FilterError::parse(message, fragment, self.position())
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn expect_char(&mut self, expected: char, message: &str) -> Result<()> {
        self.skip_whitespace();
        if self.rest().starts_with(expected) {
            self.pos += expected.len_utf8();
            Ok(())
        } else {
            Err(self.error(message))
        }
    }

    /// Parse one expression and require that nothing but whitespace follows
    fn parse_complete(&mut self) -> Result<Criteria> {
        let criteria = self.parse_expression()?;
        self.skip_whitespace();
        if !self.rest().is_empty() {
            return Err(self.error("unexpected trailing input"));
        }
        Ok(criteria)
    }

    fn parse_expression(&mut self) -> Result<Criteria> {
        self.skip_whitespace();
        let rest = self.rest();

        if rest.starts_with('(') {
            self.parse_group()
        } else if rest.starts_with('[') {
            self.parse_property()
        } else if let Some(m) = NOT_PREFIX.find(rest) {
            self.pos += m.end();
            let inner = self.parse_expression()?;
            self.expect_char(')', "missing closing parenthesis after not")?;
            Ok(Criteria::negate(inner))
        } else if let Some(m) = CURRENT_USER.find(rest) {
            self.pos += m.end();
            Ok(Criteria::current_user())
        } else if rest.is_empty() {
            Err(self.error("unexpected end of input"))
        } else {
            Err(self.error("unexpected token"))
        }
    }

    fn parse_group(&mut self) -> Result<Criteria> {
        self.pos += 1;
        let left = self.parse_expression()?;

        self.skip_whitespace();
        let rest = self.rest();
        let word_len = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let connective = &rest[..word_len];
        let combine: fn(Criteria, Criteria) -> Criteria = match connective {
            "AND" => Criteria::and,
            "OR" => Criteria::or,
            _ => return Err(self.error("expected AND or OR")),
        };
        self.pos += word_len;

        let right = self.parse_expression()?;
        self.expect_char(')', "missing closing parenthesis")?;
        Ok(combine(left, right))
    }

    fn parse_property(&mut self) -> Result<Criteria> {
        let start = self.pos;
        let close = find_closing_bracket(self.input, start)
            .ok_or_else(|| self.error("missing closing bracket"))?;

        let body = &self.input[start + 1..close];
        let body_position = self.offset + start + 1;
        self.pos = close + 1;

        if let Some(captures) = ANY_PROPERTY.captures(body) {
            if let (Some(name), Some(inner)) = (captures.get(1), captures.get(2)) {
                let mut nested = Scanner::new(inner.as_str(), body_position + inner.start(), self.culture);
                let item = nested.parse_complete()?;
                return Criteria::any(name.as_str(), item);
            }
        }

        self.parse_property_token(body, body_position)
    }

    fn parse_property_token(&self, body: &str, body_position: usize) -> Result<Criteria> {
        let tokens = split_tokens(body);
        let incomplete = || FilterError::parse("incomplete property criteria", body, body_position);

        if tokens.len() < 2 {
            return Err(incomplete());
        }
        let name = tokens[0].1;
        let (op_position, op) = tokens[1];
        let value_at = |index: usize| -> Result<Value> {
            let (offset, token) = tokens.get(index).copied().ok_or_else(incomplete)?;
            parse_value(token, self.culture, body_position + offset)
        };
        let require_len = |len: usize| -> Result<()> {
            if tokens.len() == len {
                Ok(())
            } else if tokens.len() < len {
                Err(FilterError::parse("missing value", body, body_position))
            } else {
                let (offset, token) = tokens[len];
                Err(FilterError::parse("unexpected token", token, body_position + offset))
            }
        };

        if let Some(operator) = ComparisonOperator::from_symbol(op) {
            require_len(3)?;
            return Criteria::comparison(name, value_at(2)?, operator);
        }

        if let Some(function) = FunctionType::from_name(op) {
            return match function {
                FunctionType::IsNullOrEmpty => {
                    require_len(2)?;
                    Criteria::is_null_or_empty(name)
                }
                _ => {
                    require_len(3)?;
                    Criteria::function(function, name, value_at(2)?)
                }
            };
        }

        if let Some(interval) = IntervalType::from_name(op) {
            require_len(2)?;
            return Criteria::interval(interval, name);
        }

        match op {
            "between" => {
                require_len(5)?;
                let (and_offset, and) = tokens[3];
                if and != "and" {
                    return Err(FilterError::parse(
                        "expected 'and' in between criteria",
                        and,
                        body_position + and_offset,
                    ));
                }
                Criteria::between(name, value_at(2)?, value_at(4)?)
            }
            "in" => {
                require_len(3)?;
                let (list_offset, list) = tokens[2];
                let values = self.parse_value_list(list, body_position + list_offset)?;
                Criteria::in_values(name, values)
            }
            "is" => match &tokens[2..] {
                [(_, "NULL")] => Criteria::null(name),
                [(_, "not"), (_, "NULL")] => Criteria::not_null(name),
                _ => Err(FilterError::parse(
                    "expected 'is NULL' or 'is not NULL'",
                    body,
                    body_position,
                )),
            },
            _ => Err(FilterError::parse(
                "function criteria not supported",
                op,
                body_position + op_position,
            )),
        }
    }

    fn parse_value_list(&self, list: &str, position: usize) -> Result<Vec<Value>> {
        let inner = list
            .strip_prefix('(')
            .and_then(|l| l.strip_suffix(')'))
            .ok_or_else(|| FilterError::parse("expected parenthesized value list", list, position))?;

        if inner.trim().is_empty() {
            return Ok(Vec::new());
        }

        split_outside_literals(inner, ',')
            .into_iter()
            .map(|(offset, item)| {
                let trimmed = item.trim_start();
                let lead = item.len() - trimmed.len();
                parse_value(trimmed.trim_end(), self.culture, position + 1 + offset + lead)
            })
            .collect()
    }
}

/// Tracks whether the scan is inside a `'...'` or `#...#` literal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LiteralState {
    Normal,
    Quoted,
    Hashed,
}

impl LiteralState {
    fn advance(self, c: char) -> Self {
        match (self, c) {
            (LiteralState::Normal, '\'') => LiteralState::Quoted,
            (LiteralState::Normal, '#') => LiteralState::Hashed,
            (LiteralState::Quoted, '\'') => LiteralState::Normal,
            (LiteralState::Hashed, '#') => LiteralState::Normal,
            (state, _) => state,
        }
    }
}

/// Byte index of the `]` matching the `[` at `start`
fn find_closing_bracket(input: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut state = LiteralState::Normal;

    for (i, c) in input[start..].char_indices() {
        let was_normal = state == LiteralState::Normal;
        state = state.advance(c);
        if !was_normal {
            continue;
        }
        match c {
            '[' => depth += 1,
            ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(start + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split a property token on spaces outside literals and parentheses
fn split_tokens(body: &str) -> SmallVec<[(usize, &str); 6]> {
    let mut tokens = SmallVec::new();
    let mut state = LiteralState::Normal;
    let mut parens = 0usize;
    let mut token_start: Option<usize> = None;

    for (i, c) in body.char_indices() {
        let was_normal = state == LiteralState::Normal;
        state = state.advance(c);

        if was_normal && c == ' ' && parens == 0 {
            if let Some(s) = token_start.take() {
                tokens.push((s, &body[s..i]));
            }
            continue;
        }

        if was_normal {
            match c {
                '(' => parens += 1,
                ')' => parens = parens.saturating_sub(1),
                _ => {}
            }
        }
        token_start.get_or_insert(i);
    }

    if let Some(s) = token_start {
        tokens.push((s, &body[s..]));
    }
    tokens
}

/// Split on `separator` outside literals, keeping each piece's offset
fn split_outside_literals(text: &str, separator: char) -> Vec<(usize, &str)> {
    let mut pieces = Vec::new();
    let mut state = LiteralState::Normal;
    let mut piece_start = 0;

    for (i, c) in text.char_indices() {
        let was_normal = state == LiteralState::Normal;
        state = state.advance(c);
        if was_normal && c == separator {
            pieces.push((piece_start, &text[piece_start..i]));
            piece_start = i + c.len_utf8();
        }
    }
    pieces.push((piece_start, &text[piece_start..]));
    pieces
}
