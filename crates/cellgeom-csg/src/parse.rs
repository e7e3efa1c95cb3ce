//! Cell expression parser.
//!
//! Grammar, with intersection binding tighter than union:
//!
//! ```text
//! union  := inter (':' inter)*
//! inter  := unary unary*
//! unary  := '#' '(' union ')' | '#' INT | '(' union ')' | INT
//! ```
//!
//! `INT` is a signed, non-zero surface key: `3` is the positive side of
//! surface 3 and `-3` the negative side. `#N` is the complement of object
//! `N` and stays unresolved until the object table inlines it.

use std::str::FromStr;

use crate::error::{CsgError, Result};
use crate::rule::{NodeId, RuleTree};

/// A token of a cell expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Signed integer.
    Integer(i64),
    /// `(`.
    LParen,
    /// `)`.
    RParen,
    /// `:` (union).
    Colon,
    /// `#` (complement).
    Hash,
}

impl Token {
    fn text(&self) -> String {
        match self {
            Token::Integer(v) => v.to_string(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
            Token::Colon => ":".into(),
            Token::Hash => "#".into(),
        }
    }
}

/// A token with its byte offset in the expression.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    /// The token.
    pub token: Token,
    /// Byte offset where the token starts.
    pub position: usize,
}

/// Split an expression into tokens.
pub fn tokenize(input: &str) -> Result<Vec<SpannedToken>> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let ch = bytes[pos];
        let start = pos;
        let token = match ch {
            c if c.is_ascii_whitespace() => {
                pos += 1;
                continue;
            }
            b'(' => Token::LParen,
            b')' => Token::RParen,
            b':' => Token::Colon,
            b'#' => Token::Hash,
            b'-' | b'+' | b'0'..=b'9' => {
                let mut end = pos + 1;
                while end < bytes.len() && bytes[end].is_ascii_digit() {
                    end += 1;
                }
                let text = &input[start..end];
                if end == start + 1 && !ch.is_ascii_digit() {
                    return Err(CsgError::UnexpectedToken {
                        token: text.to_string(),
                        position: start,
                    });
                }
                let value = text.parse::<i64>().map_err(|_| CsgError::InvalidSurfaceKey {
                    token: text.to_string(),
                })?;
                pos = end;
                tokens.push(SpannedToken {
                    token: Token::Integer(value),
                    position: start,
                });
                continue;
            }
            _ => {
                let token = input[start..]
                    .chars()
                    .next()
                    .map(String::from)
                    .unwrap_or_default();
                return Err(CsgError::UnexpectedToken {
                    token,
                    position: start,
                });
            }
        };
        pos += 1;
        tokens.push(SpannedToken {
            token,
            position: start,
        });
    }
    Ok(tokens)
}

/// Parse an expression into a rule tree. Leaves are not yet slotted.
pub fn parse(input: &str) -> Result<RuleTree> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(CsgError::Empty);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        end: input.len(),
        tree: RuleTree::new(),
    };
    let root = parser.parse_union()?;
    if let Some(tok) = parser.peek() {
        return Err(match tok.token {
            Token::RParen => CsgError::UnbalancedParentheses {
                position: tok.position,
            },
            _ => CsgError::UnexpectedToken {
                token: tok.token.text(),
                position: tok.position,
            },
        });
    }
    parser.tree.set_root(root);
    Ok(parser.tree)
}

impl FromStr for RuleTree {
    type Err = CsgError;

    fn from_str(s: &str) -> Result<Self> {
        parse(s)
    }
}

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    depth: usize,
    end: usize,
    tree: RuleTree,
}

impl Parser {
    fn peek(&self) -> Option<&SpannedToken> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<SpannedToken> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn position(&self) -> usize {
        self.peek().map_or(self.end, |t| t.position)
    }

    fn starts_unary(&self) -> bool {
        matches!(
            self.peek().map(|t| &t.token),
            Some(Token::Integer(_) | Token::LParen | Token::Hash)
        )
    }

    fn parse_union(&mut self) -> Result<NodeId> {
        let mut left = self.parse_intersection()?;
        while matches!(self.peek().map(|t| &t.token), Some(Token::Colon)) {
            self.advance();
            let right = self.parse_intersection()?;
            left = self.tree.union(left, right);
        }
        Ok(left)
    }

    fn parse_intersection(&mut self) -> Result<NodeId> {
        let mut left = self.parse_unary()?;
        while self.starts_unary() {
            let right = self.parse_unary()?;
            left = self.tree.intersection(left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<NodeId> {
        let position = self.position();
        let Some(tok) = self.advance() else {
            return Err(CsgError::MissingOperand { position });
        };
        match tok.token {
            Token::Integer(value) => self.surface_leaf(value),
            Token::LParen => self.parse_group(tok.position),
            Token::Hash => self.parse_complement(),
            Token::RParen if self.depth == 0 => {
                Err(CsgError::UnbalancedParentheses { position })
            }
            Token::RParen | Token::Colon => Err(CsgError::MissingOperand { position }),
        }
    }

    fn surface_leaf(&mut self, value: i64) -> Result<NodeId> {
        match i32::try_from(value) {
            Ok(key) if key != 0 && key != i32::MIN => Ok(self.tree.leaf(key)),
            _ => Err(CsgError::InvalidSurfaceKey {
                token: value.to_string(),
            }),
        }
    }

    /// Body and closing parenthesis of a group opened at `open`.
    fn parse_group(&mut self, open: usize) -> Result<NodeId> {
        self.depth += 1;
        let inner = self.parse_union()?;
        self.depth -= 1;
        match self.advance() {
            Some(SpannedToken {
                token: Token::RParen,
                ..
            }) => Ok(inner),
            None => Err(CsgError::UnbalancedParentheses { position: open }),
            Some(other) => Err(CsgError::UnexpectedToken {
                token: other.token.text(),
                position: other.position,
            }),
        }
    }

    fn parse_complement(&mut self) -> Result<NodeId> {
        let position = self.position();
        match self.advance() {
            Some(SpannedToken {
                token: Token::LParen,
                position: open,
            }) => {
                let inner = self.parse_group(open)?;
                Ok(self.tree.complement(inner))
            }
            Some(SpannedToken {
                token: Token::Integer(value),
                position,
            }) => match i32::try_from(value) {
                Ok(id) if id > 0 => Ok(self.tree.object_complement(id)),
                _ => Err(CsgError::UnexpectedToken {
                    token: value.to_string(),
                    position,
                }),
            },
            Some(SpannedToken {
                token: Token::RParen | Token::Colon,
                ..
            })
            | None => Err(CsgError::MissingOperand { position }),
            Some(SpannedToken {
                token: Token::Hash,
                position,
            }) => Err(CsgError::UnexpectedToken {
                token: "#".into(),
                position,
            }),
        }
    }
}
