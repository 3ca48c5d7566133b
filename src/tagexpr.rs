// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Boolean tag expressions selecting [`Pickle`]s and hooks.
//!
//! Grammar (loosest to tightest binding): `or`, `and`, `not`, parentheses.
//! A bare word is a tag literal matched verbatim against a [`Pickle`]'s tags.
//!
//! [`Pickle`]: crate::Pickle

use std::{fmt, iter, str::FromStr};

use derive_more::{Display, Error};

/// Parsed boolean expression over tags.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TagExpr {
    /// Single tag literal.
    Tag(String),

    /// Negation of the inner [`TagExpr`].
    Not(Box<TagExpr>),

    /// Conjunction of two [`TagExpr`]s.
    And(Box<TagExpr>, Box<TagExpr>),

    /// Disjunction of two [`TagExpr`]s.
    Or(Box<TagExpr>, Box<TagExpr>),
}

impl TagExpr {
    /// Evaluates this [`TagExpr`] for the given `tags`.
    #[must_use]
    pub fn eval<I, S>(&self, tags: I) -> bool
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S> + Clone,
    {
        match self {
            Self::And(l, r) => l.eval(tags.clone()) & r.eval(tags),
            Self::Or(l, r) => l.eval(tags.clone()) | r.eval(tags),
            Self::Not(t) => !t.eval(tags),
            Self::Tag(t) => tags.into_iter().any(|tag| tag.as_ref() == t),
        }
    }
}

impl fmt::Display for TagExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(t) => write!(f, "{t}"),
            Self::Not(t) => write!(f, "not ({t})"),
            Self::And(l, r) => write!(f, "({l}) and ({r})"),
            Self::Or(l, r) => write!(f, "({l}) or ({r})"),
        }
    }
}

impl FromStr for TagExpr {
    type Err = TagExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = tokenize(s)?.into_iter().peekable();
        let expr = parse_or(&mut tokens)?;
        if let Some(tok) = tokens.next() {
            return Err(TagExprError::UnexpectedToken(tok.to_string()));
        }
        Ok(expr)
    }
}

/// Error of parsing a [`TagExpr`] out of a string.
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
pub enum TagExprError {
    /// Expression ended where more input was expected.
    #[display("unexpected end of tag expression")]
    UnexpectedEnd,

    /// Token that doesn't fit the grammar at its position.
    #[display("unexpected token `{_0}` in tag expression")]
    UnexpectedToken(#[error(not(source))] String),

    /// Opening parenthesis without a matching closing one.
    #[display("unbalanced parentheses in tag expression")]
    UnbalancedParen,
}

#[derive(Clone, Debug, Display, Eq, PartialEq)]
enum Token {
    #[display("(")]
    OpenParen,
    #[display(")")]
    CloseParen,
    #[display("and")]
    And,
    #[display("or")]
    Or,
    #[display("not")]
    Not,
    #[display("{_0}")]
    Tag(String),
}

fn tokenize(s: &str) -> Result<Vec<Token>, TagExprError> {
    let mut out = Vec::new();
    let mut chars = s.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            '(' => {
                drop(chars.next());
                out.push(Token::OpenParen);
            }
            ')' => {
                drop(chars.next());
                out.push(Token::CloseParen);
            }
            c if c.is_whitespace() => drop(chars.next()),
            _ => {
                let word: String = iter::from_fn(|| {
                    chars.next_if(|&c| !c.is_whitespace() && c != '(' && c != ')')
                })
                .collect();
                out.push(match word.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    _ => Token::Tag(word),
                });
            }
        }
    }
    Ok(out)
}

type Tokens = iter::Peekable<std::vec::IntoIter<Token>>;

fn parse_or(tokens: &mut Tokens) -> Result<TagExpr, TagExprError> {
    let mut lhs = parse_and(tokens)?;
    while tokens.next_if_eq(&Token::Or).is_some() {
        let rhs = parse_and(tokens)?;
        lhs = TagExpr::Or(Box::new(lhs), Box::new(rhs));
    }
    Ok(lhs)
}

fn parse_and(tokens: &mut Tokens) -> Result<TagExpr, TagExprError> {
    let mut lhs = parse_unary(tokens)?;
    while tokens.next_if_eq(&Token::And).is_some() {
        let rhs = parse_unary(tokens)?;
        lhs = TagExpr::And(Box::new(lhs), Box::new(rhs));
    }
    Ok(lhs)
}

fn parse_unary(tokens: &mut Tokens) -> Result<TagExpr, TagExprError> {
    match tokens.next().ok_or(TagExprError::UnexpectedEnd)? {
        Token::Not => Ok(TagExpr::Not(Box::new(parse_unary(tokens)?))),
        Token::OpenParen => {
            let inner = parse_or(tokens)?;
            if tokens.next_if_eq(&Token::CloseParen).is_none() {
                return Err(TagExprError::UnbalancedParen);
            }
            Ok(inner)
        }
        Token::Tag(t) => Ok(TagExpr::Tag(t)),
        tok => Err(TagExprError::UnexpectedToken(tok.to_string())),
    }
}
