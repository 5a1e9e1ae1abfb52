use std::fmt::Display;

use miette::Report;

pub mod eval;
pub mod lex;
pub mod parse;
pub mod rational;
pub mod repl;

pub use eval::{EvalError, LocatedEvalError, evaluate};
pub use lex::{Lexer, ParseError, Token, TokenKind};
pub use parse::{Expr, Op, Parser, parse};
pub use rational::{ArithmeticError, Rational};

/// What went wrong, independent of where it was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    DivisionByZero,
    MalformedNumber,
    UnmatchedParenthesis,
    UnexpectedCharacter,
    TooDeep,
    ArithmeticOverflow,
    NonIntegerExponent,
}

impl From<ArithmeticError> for ErrorKind {
    fn from(error: ArithmeticError) -> Self {
        match error {
            ArithmeticError::DivisionByZero => ErrorKind::DivisionByZero,
            ArithmeticError::Overflow => ErrorKind::ArithmeticOverflow,
        }
    }
}

/// An exact result together with its floating approximation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub exact: Rational,
    pub approx: f64,
}

impl From<Rational> for Evaluation {
    fn from(exact: Rational) -> Self {
        Evaluation {
            exact,
            approx: exact.to_f64(),
        }
    }
}

impl Display for Evaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (≈ {})", self.exact, self.approx)
    }
}

/// Parses and evaluates `source` in one go.
///
/// Evaluation failures are reported against `source` so their labels point
/// at the failing operator.
///
/// ```
/// let result = fraction_calc::compile_and_evaluate(None, "(1/2 + 1/3) * 3/4").unwrap();
/// assert_eq!(result.to_string(), "5/8 (≈ 0.625)");
/// ```
pub fn compile_and_evaluate(filename: Option<&str>, source: &str) -> miette::Result<Evaluation> {
    let expr = Parser::new(filename, source).parse()?;
    log::debug!("AST:\n{expr:#}");

    let value = expr
        .evaluate()
        .map_err(|error| LocatedEvalError::new(error, filename, source))?;
    Ok(value.into())
}

/// Recovers the [`ErrorKind`] of a report produced by this crate.
pub fn error_kind(report: &Report) -> Option<ErrorKind> {
    if let Some(e) = report.downcast_ref::<ParseError>() {
        Some(e.kind())
    } else {
        report
            .downcast_ref::<LocatedEvalError>()
            .map(|e| e.error.kind())
    }
}
