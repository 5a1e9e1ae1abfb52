use std::fmt::Display;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode, SourceSpan};
use thiserror::Error;

use crate::{
    ArithmeticError, ErrorKind, Rational,
    parse::{Expr, Op},
};

#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("{error} while evaluating `{op}`")]
    #[diagnostic(code(eval::arithmetic))]
    Arithmetic {
        op: Op,

        #[label("this operation")]
        operator: SourceSpan,

        error: ArithmeticError,
    },

    #[error("Exponent {exponent} is not a whole number")]
    #[diagnostic(
        code(eval::non_integer_exponent),
        help("only integer powers keep the result exact")
    )]
    NonIntegerExponent {
        #[label("raised to a fractional power here")]
        operator: SourceSpan,

        exponent: Rational,
    },
}

impl EvalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EvalError::Arithmetic { error, .. } => (*error).into(),
            EvalError::NonIntegerExponent { .. } => ErrorKind::NonIntegerExponent,
        }
    }

    /// Byte offset of the operator that failed.
    pub fn offset(&self) -> usize {
        match self {
            EvalError::Arithmetic { operator, .. }
            | EvalError::NonIntegerExponent { operator, .. } => operator.offset(),
        }
    }
}

/// An [`EvalError`] paired with the source text it was evaluated from, so
/// its labels render against that text.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct LocatedEvalError {
    pub error: EvalError,
    src: NamedSource<String>,
}

impl LocatedEvalError {
    pub fn new(error: EvalError, filename: Option<&str>, source: &str) -> Self {
        LocatedEvalError {
            error,
            src: NamedSource::new(filename.unwrap_or("<input>"), source.to_string()),
        }
    }
}

impl Diagnostic for LocatedEvalError {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        self.error.code()
    }

    fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        self.error.help()
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        self.error.labels()
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(&self.src)
    }
}

impl Expr {
    /// Evaluates the tree exactly, left operand before right.
    pub fn evaluate(&self) -> Result<Rational, EvalError> {
        match self {
            Expr::Number(n) => Ok(*n),
            Expr::BinaryOp {
                op,
                offset,
                left,
                right,
            } => {
                let lhs = left.evaluate()?;
                let rhs = right.evaluate()?;
                let operator = SourceSpan::from(*offset..*offset + 1);

                let value = match op {
                    Op::Plus => lhs.add(rhs),
                    Op::Minus => lhs.subtract(rhs),
                    Op::Star => lhs.multiply(rhs),
                    Op::Slash => lhs.divide(rhs),
                    Op::Caret => {
                        if !rhs.is_integer() {
                            return Err(EvalError::NonIntegerExponent {
                                operator,
                                exponent: rhs,
                            });
                        }
                        lhs.pow(rhs.numerator())
                    }
                }
                .map_err(|error| EvalError::Arithmetic {
                    op: *op,
                    operator,
                    error,
                })?;

                log::trace!("{lhs} {op} {rhs} = {value}");
                Ok(value)
            }
        }
    }
}

pub fn evaluate(expr: &Expr) -> Result<Rational, EvalError> {
    expr.evaluate()
}
