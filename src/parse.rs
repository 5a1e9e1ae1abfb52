use std::fmt::Display;

use miette::SourceSpan;

use crate::{
    Lexer, Rational,
    lex::{ParseError, Token, TokenKind},
};

/// Deepest tree, and deepest parenthesis nesting, the parser accepts.
pub const MAX_DEPTH: usize = 256;

pub struct Parser<'de> {
    whole: &'de str,
    lexer: Lexer<'de>,
    nesting: usize,
}

/// A parsed expression. Each operation owns its two operands.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(Rational),
    BinaryOp {
        op: Op,
        /// Byte offset of the operator in the source.
        offset: usize,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
}

impl Op {
    fn from_token(kind: TokenKind) -> Option<Op> {
        Some(match kind {
            TokenKind::Plus => Op::Plus,
            TokenKind::Minus => Op::Minus,
            TokenKind::Star => Op::Star,
            TokenKind::Slash => Op::Slash,
            TokenKind::Caret => Op::Caret,
            _ => return None,
        })
    }
}

impl<'de> Parser<'de> {
    pub fn new(filename: Option<&'de str>, whole: &'de str) -> Self {
        Parser {
            whole,
            lexer: Lexer::new(filename, whole),
            nesting: 0,
        }
    }

    /// Parses the whole input as a single expression.
    pub fn parse(mut self) -> Result<Expr, ParseError> {
        let (expr, _) = self.parse_within(0)?;
        match self.lexer.next() {
            None => {
                log::debug!("parsed `{}` as {expr}", self.whole.trim());
                Ok(expr)
            }
            Some(Ok(token)) => Err(self.lexer.unexpected(&token)),
            Some(Err(e)) => Err(e),
        }
    }

    /// Returns the parsed operand together with the height of its tree.
    fn parse_within(&mut self, min_bp: u8) -> Result<(Expr, usize), ParseError> {
        if self.nesting >= MAX_DEPTH {
            return Err(self.too_deep(self.lexer.byte));
        }
        self.nesting += 1;
        let parsed = self.parse_operand(min_bp);
        self.nesting -= 1;
        parsed
    }

    fn parse_operand(&mut self, min_bp: u8) -> Result<(Expr, usize), ParseError> {
        let lhs = match self.lexer.next() {
            Some(Ok(token)) => token,
            None => return Err(self.lexer.eof()),
            Some(Err(e)) => return Err(e),
        };

        let (mut lhs, mut height) = match lhs {
            Token {
                kind: TokenKind::Number(n),
                ..
            } => (Expr::Number(n), 1),
            Token {
                kind: TokenKind::LeftParen,
                offset,
                ..
            } => {
                let inner = self.parse_within(0)?;
                self.expect_closing(offset)?;
                inner
            }
            token => return Err(self.lexer.unexpected(&token)),
        };

        loop {
            let Some(token) = self.lexer.peek()? else {
                break;
            };
            // anything else ends this operand; the caller decides if it belongs there
            let Some(op) = Op::from_token(token.kind) else {
                break;
            };

            let (l_bp, r_bp) = infix_binding_power(op);
            if l_bp < min_bp {
                break;
            }
            self.lexer.next();

            let (rhs, rhs_height) = self.parse_within(r_bp)?;
            height = height.max(rhs_height) + 1;
            if height > MAX_DEPTH {
                return Err(self.too_deep(token.offset));
            }
            lhs = Expr::BinaryOp {
                op,
                offset: token.offset,
                left: Box::new(lhs),
                right: Box::new(rhs),
            };
        }

        Ok((lhs, height))
    }

    fn too_deep(&self, offset: usize) -> ParseError {
        ParseError::TooDeep {
            src: self.lexer.source(),
            bad_bit: SourceSpan::from(offset..offset),
            limit: MAX_DEPTH,
        }
    }

    fn expect_closing(&mut self, open: usize) -> Result<(), ParseError> {
        let bad_bit = match self.lexer.next() {
            Some(Ok(Token {
                kind: TokenKind::RightParen,
                ..
            })) => return Ok(()),
            Some(Ok(token)) => SourceSpan::from(token.offset..token.offset + token.literal.len()),
            Some(Err(e)) => return Err(e),
            None => SourceSpan::from(self.whole.len()..self.whole.len()),
        };
        Err(ParseError::UnmatchedParenthesis {
            src: self.lexer.source(),
            open: SourceSpan::from(open..open + 1),
            bad_bit,
        })
    }
}

/// `^` binds exactly like `*` and `/`, and all three associate to the left.
fn infix_binding_power(op: Op) -> (u8, u8) {
    match op {
        Op::Plus | Op::Minus => (1, 2),
        Op::Star | Op::Slash | Op::Caret => (3, 4),
    }
}

pub fn parse(source: &str) -> Result<Expr, ParseError> {
    Parser::new(None, source).parse()
}

impl Expr {
    fn write_tree(&self, f: &mut std::fmt::Formatter<'_>, indent: usize) -> std::fmt::Result {
        match self {
            Expr::Number(n) => writeln!(f, "{:indent$}Number: {n}", ""),
            Expr::BinaryOp {
                op, left, right, ..
            } => {
                writeln!(f, "{:indent$}BinaryOp: {op}", "")?;
                left.write_tree(f, indent + 2)?;
                right.write_tree(f, indent + 2)
            }
        }
    }
}

/// `{}` gives an s-expression, `{:#}` an indented tree.
impl Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            return self.write_tree(f, 0);
        }
        match self {
            Expr::Number(n) => write!(f, "{n}"),
            Expr::BinaryOp {
                op, left, right, ..
            } => write!(f, "({op} {left} {right})"),
        }
    }
}

impl Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Op::Plus => "+",
            Op::Minus => "-",
            Op::Star => "*",
            Op::Slash => "/",
            Op::Caret => "^",
        };
        f.write_str(symbol)
    }
}
