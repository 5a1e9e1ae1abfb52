use std::fmt::Display;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::{ArithmeticError, ErrorKind, Rational};

#[derive(Error, Debug, Diagnostic)]
pub enum ParseError {
    #[error("Unexpected character '{token}'")]
    #[diagnostic(
        code(parse::unexpected_character),
        help("remove or correct the character: `{token}`")
    )]
    UnexpectedCharacter {
        #[source_code]
        src: NamedSource<String>,

        #[label("this character")]
        bad_bit: SourceSpan,

        token: char,
    },

    #[error("Malformed number")]
    #[diagnostic(
        code(parse::malformed_number),
        help("write numbers as `12`, `-12` or `3/4`, with digits on both sides of the `/`")
    )]
    MalformedNumber {
        #[source_code]
        src: NamedSource<String>,

        #[label("digits are missing from this literal")]
        bad_bit: SourceSpan,
    },

    #[error("Unmatched parenthesis")]
    #[diagnostic(code(parse::unmatched_parenthesis), help("add a closing `)`"))]
    UnmatchedParenthesis {
        #[source_code]
        src: NamedSource<String>,

        #[label("this parenthesis is never closed")]
        open: SourceSpan,

        #[label("expected `)` here")]
        bad_bit: SourceSpan,
    },

    #[error("Unexpected end of input")]
    #[diagnostic(
        code(parse::unexpected_eof),
        help("the expression ended where a number or `(` was expected")
    )]
    UnexpectedEof {
        #[source_code]
        src: NamedSource<String>,

        #[label("expected a number here")]
        bad_bit: SourceSpan,
    },

    #[error("Expression nests deeper than {limit} levels")]
    #[diagnostic(
        code(parse::too_deep),
        help("split the calculation into smaller expressions")
    )]
    TooDeep {
        #[source_code]
        src: NamedSource<String>,

        #[label("nesting limit reached here")]
        bad_bit: SourceSpan,

        limit: usize,
    },

    #[error("{error} in numeric literal")]
    #[diagnostic(code(parse::invalid_literal))]
    InvalidLiteral {
        #[source_code]
        src: NamedSource<String>,

        #[label("this numeric literal")]
        bad_bit: SourceSpan,

        error: ArithmeticError,
    },
}

impl ParseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::UnexpectedCharacter { .. } => ErrorKind::UnexpectedCharacter,
            ParseError::MalformedNumber { .. } => ErrorKind::MalformedNumber,
            ParseError::UnmatchedParenthesis { .. } => ErrorKind::UnmatchedParenthesis,
            // running out of input is a missing character where a factor was expected
            ParseError::UnexpectedEof { .. } => ErrorKind::UnexpectedCharacter,
            ParseError::TooDeep { .. } => ErrorKind::TooDeep,
            ParseError::InvalidLiteral { error, .. } => (*error).into(),
        }
    }

    /// Byte offset of the offending input.
    pub fn offset(&self) -> usize {
        self.bad_bit().offset()
    }

    pub fn line(&self) -> usize {
        let src = match self {
            ParseError::UnexpectedCharacter { src, .. }
            | ParseError::MalformedNumber { src, .. }
            | ParseError::UnmatchedParenthesis { src, .. }
            | ParseError::UnexpectedEof { src, .. }
            | ParseError::TooDeep { src, .. }
            | ParseError::InvalidLiteral { src, .. } => src,
        };
        src.inner()[..self.offset()].matches('\n').count() + 1
    }

    fn bad_bit(&self) -> SourceSpan {
        match self {
            ParseError::UnexpectedCharacter { bad_bit, .. }
            | ParseError::MalformedNumber { bad_bit, .. }
            | ParseError::UnmatchedParenthesis { bad_bit, .. }
            | ParseError::UnexpectedEof { bad_bit, .. }
            | ParseError::TooDeep { bad_bit, .. }
            | ParseError::InvalidLiteral { bad_bit, .. } => *bad_bit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'de> {
    pub kind: TokenKind,
    pub literal: &'de str,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    LeftParen,
    RightParen,
    Minus,
    Plus,
    Star,
    Slash,
    Caret,
    Number(Rational),
}

impl Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lit = self.literal;
        match self.kind {
            TokenKind::LeftParen => write!(f, "LEFT_PAREN {lit} null"),
            TokenKind::RightParen => write!(f, "RIGHT_PAREN {lit} null"),
            TokenKind::Minus => write!(f, "MINUS {lit} null"),
            TokenKind::Plus => write!(f, "PLUS {lit} null"),
            TokenKind::Star => write!(f, "STAR {lit} null"),
            TokenKind::Slash => write!(f, "SLASH {lit} null"),
            TokenKind::Caret => write!(f, "CARET {lit} null"),
            TokenKind::Number(n) => write!(f, "NUMBER {lit} {n}"),
        }
    }
}

/// Scans an expression into tokens.
///
/// A `-` starts a negative literal wherever an operand is expected (at the
/// start, after an operator, after `(`) and is the subtraction operator
/// everywhere else. A `/` directly after a literal's digits is part of the
/// literal, so `3/4` is one token while `3 / 4` is three.
///
/// The cursor position stays private to the crate:
///
/// ```compile_fail
/// let lexer = fraction_calc::Lexer::new(None, "1 + 2");
/// let _ = lexer.byte;
/// ```
pub struct Lexer<'de> {
    filename: Option<&'de str>,
    whole: &'de str,
    rest: &'de str,
    pub(crate) byte: usize,
    peeked: Option<Result<Token<'de>, ParseError>>,
    operand: bool,
}

impl<'de> Lexer<'de> {
    pub fn new(filename: Option<&'de str>, input: &'de str) -> Self {
        Lexer {
            filename,
            whole: input,
            rest: input,
            byte: 0,
            peeked: None,
            operand: true,
        }
    }

    pub fn peek(&mut self) -> Result<Option<Token<'de>>, ParseError> {
        if self.peeked.is_none() {
            self.peeked = self.next();
        }
        match self.peeked.take() {
            Some(Ok(token)) => {
                self.peeked = Some(Ok(token));
                Ok(Some(token))
            }
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }

    pub fn source(&self) -> NamedSource<String> {
        NamedSource::new(self.filename.unwrap_or("<input>"), self.whole.to_string())
    }

    pub(crate) fn unexpected(&self, token: &Token<'de>) -> ParseError {
        // tokens are never empty
        let c = token.literal.chars().next().unwrap_or_default();
        ParseError::UnexpectedCharacter {
            src: self.source(),
            bad_bit: SourceSpan::from(token.offset..token.offset + c.len_utf8()),
            token: c,
        }
    }

    pub(crate) fn eof(&self) -> ParseError {
        ParseError::UnexpectedEof {
            src: self.source(),
            bad_bit: SourceSpan::from(self.whole.len()..self.whole.len()),
        }
    }

    fn number(&mut self, cur: &'de str, start: usize) -> Result<Token<'de>, ParseError> {
        let digits = |s: &str| s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());

        let sign = usize::from(cur.starts_with('-'));
        let numerator_end = sign + digits(&cur[sign..]);
        let mut malformed = numerator_end == sign;

        let mut end = numerator_end;
        let mut denominator = None;
        if !malformed && cur[end..].starts_with('/') {
            let denominator_start = end + 1;
            end = denominator_start + digits(&cur[denominator_start..]);
            malformed = end == denominator_start;
            denominator = Some(&cur[denominator_start..end]);
        }

        let literal = &cur[..end];
        // the first character has already been consumed
        let extra_bytes = literal.len() - 1;
        self.byte += extra_bytes;
        self.rest = &self.rest[extra_bytes..];
        self.operand = false;

        let bad_bit = SourceSpan::from(start..self.byte);
        if malformed {
            return Err(ParseError::MalformedNumber {
                src: self.source(),
                bad_bit,
            });
        }

        let invalid = |error: ArithmeticError| ParseError::InvalidLiteral {
            src: self.source(),
            bad_bit,
            error,
        };
        // the digit runs are non-empty, so parsing can only fail on overflow
        let numerator: i64 = cur[..numerator_end]
            .parse()
            .map_err(|_| invalid(ArithmeticError::Overflow))?;
        let value = match denominator {
            Some(text) => {
                let denominator: i64 = text
                    .parse()
                    .map_err(|_| invalid(ArithmeticError::Overflow))?;
                Rational::new(numerator, denominator).map_err(invalid)?
            }
            None => Rational::from_integer(numerator),
        };

        Ok(Token {
            kind: TokenKind::Number(value),
            literal,
            offset: start,
        })
    }
}

impl<'de> Iterator for Lexer<'de> {
    type Item = Result<Token<'de>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(peeked) = self.peeked.take() {
            return Some(peeked);
        }
        loop {
            let mut chars = self.rest.chars();
            let c = chars.next()?;
            let start = self.byte;
            let literal = &self.rest[..c.len_utf8()];
            let cur = self.rest;
            self.rest = chars.as_str();
            self.byte += c.len_utf8();

            let kind = match c {
                c if c.is_whitespace() => continue,
                '-' if self.operand => return Some(self.number(cur, start)),
                '0'..='9' => return Some(self.number(cur, start)),
                '(' => TokenKind::LeftParen,
                ')' => TokenKind::RightParen,
                '-' => TokenKind::Minus,
                '+' => TokenKind::Plus,
                '*' => TokenKind::Star,
                '/' => TokenKind::Slash,
                '^' => TokenKind::Caret,
                c => {
                    return Some(Err(ParseError::UnexpectedCharacter {
                        src: self.source(),
                        bad_bit: SourceSpan::from(start..self.byte),
                        token: c,
                    }));
                }
            };

            self.operand = kind != TokenKind::RightParen;
            return Some(Ok(Token {
                kind,
                literal,
                offset: start,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(None, input)
            .map(|token| token.map(|t| t.kind))
            .collect::<Result<_, _>>()
            .unwrap()
    }

    fn number(n: i64, d: i64) -> TokenKind {
        TokenKind::Number(Rational::new(n, d).unwrap())
    }

    fn error(input: &str) -> ParseError {
        Lexer::new(None, input)
            .find_map(Result::err)
            .expect("input should fail to lex")
    }

    #[test]
    fn fractions_are_single_tokens() {
        assert_eq!(
            kinds("1/2 + 3"),
            vec![number(1, 2), TokenKind::Plus, number(3, 1)]
        );
        assert_eq!(kinds("2/4"), vec![number(1, 2)]);
    }

    #[test]
    fn spaced_slash_is_division() {
        assert_eq!(
            kinds("1 / 2"),
            vec![number(1, 1), TokenKind::Slash, number(2, 1)]
        );
        assert_eq!(
            kinds("1/2/3"),
            vec![number(1, 2), TokenKind::Slash, number(3, 1)]
        );
    }

    #[test]
    fn minus_depends_on_position() {
        assert_eq!(kinds("-3"), vec![number(-3, 1)]);
        assert_eq!(
            kinds("4/2-1/3"),
            vec![number(2, 1), TokenKind::Minus, number(1, 3)]
        );
        assert_eq!(
            kinds("1 - -1/2"),
            vec![number(1, 1), TokenKind::Minus, number(-1, 2)]
        );
        assert_eq!(
            kinds("(-1)-1"),
            vec![
                TokenKind::LeftParen,
                number(-1, 1),
                TokenKind::RightParen,
                TokenKind::Minus,
                number(1, 1)
            ]
        );
    }

    #[test]
    fn whitespace_and_newlines_are_skipped() {
        assert_eq!(
            kinds(" 2\n^\t3 "),
            vec![number(2, 1), TokenKind::Caret, number(3, 1)]
        );
        assert!(kinds("   ").is_empty());
    }

    #[test]
    fn offsets_and_literals() {
        let tokens: Vec<_> = Lexer::new(None, "  12/8 * (3)")
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(tokens[0].literal, "12/8");
        assert_eq!(tokens[0].offset, 2);
        assert_eq!(tokens[1].offset, 7);
        assert_eq!(tokens[3].literal, "3");
        assert_eq!(tokens[3].offset, 10);
        assert_eq!(tokens[0].to_string(), "NUMBER 12/8 3/2");
        assert_eq!(tokens[1].to_string(), "STAR * null");
    }

    #[test]
    fn unexpected_character() {
        let e = error("1 + @");
        assert_eq!(e.kind(), ErrorKind::UnexpectedCharacter);
        assert_eq!(e.offset(), 4);
        assert!(matches!(e, ParseError::UnexpectedCharacter { token: '@', .. }));
    }

    #[test]
    fn malformed_numbers() {
        assert_eq!(error("- 3").kind(), ErrorKind::MalformedNumber);
        assert_eq!(error("3/").kind(), ErrorKind::MalformedNumber);
        assert_eq!(error("3/ 4").kind(), ErrorKind::MalformedNumber);
        assert_eq!(error("2 * -").kind(), ErrorKind::MalformedNumber);
    }

    #[test]
    fn invalid_literals() {
        assert_eq!(error("1/0").kind(), ErrorKind::DivisionByZero);
        assert_eq!(
            error("99999999999999999999").kind(),
            ErrorKind::ArithmeticOverflow
        );
    }

    #[test]
    fn peek_does_not_consume() {
        let mut lexer = Lexer::new(None, "1 +");
        let peeked = lexer.peek().unwrap().unwrap();
        assert_eq!(lexer.next().unwrap().unwrap(), peeked);
        assert_eq!(lexer.next().unwrap().unwrap().kind, TokenKind::Plus);
        assert!(lexer.peek().unwrap().is_none());
    }

    #[test]
    fn line_numbers() {
        assert_eq!(error("1 +\n2 +\n#").line(), 3);
        assert_eq!(error("#").line(), 1);
    }
}
