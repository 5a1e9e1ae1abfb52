use std::io::{BufRead, Write};

use crate::{Parser, compile_and_evaluate};

pub const EXAMPLES: [&str; 7] = [
    "1/2 + 1/3",
    "3/4 * 2/3",
    "2/3 ^ 2",
    "1/2 + 1/4 * 2",
    "(1/2 + 1/3) * 3/4",
    "2 ^ 3",
    "4/2 - 1/3",
];

#[derive(Debug, Clone, Copy)]
pub struct Options {
    pub examples: bool,
    pub show_ast: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            examples: true,
            show_ast: false,
        }
    }
}

/// Runs the interactive shell until `quit`, `exit` or end of input.
///
/// Results go to `out`, diagnostics to `err`; a failing line never stops
/// the loop.
pub fn run(
    mut input: impl BufRead,
    out: &mut impl Write,
    err: &mut impl Write,
    options: Options,
) -> std::io::Result<()> {
    if options.examples {
        writeln!(out, "Examples:")?;
        writeln!(out, "{}", "-".repeat(40))?;
        for example in EXAMPLES {
            match compile_and_evaluate(None, example) {
                Ok(result) => writeln!(out, "{example} = {result}")?,
                Err(e) => writeln!(err, "{example}: {e:?}")?,
            }
        }
        writeln!(out)?;
    }

    writeln!(out, "Fraction calculator")?;
    writeln!(out, "Supports: +, -, *, /, ^, fractions (a/b)")?;
    writeln!(out, "Type 'quit' to exit")?;
    writeln!(out, "{}", "=".repeat(40))?;

    let mut line = Vec::new();
    loop {
        write!(out, ">>> ")?;
        out.flush()?;

        line.clear();
        // bytes that are not UTF-8 are replaced so the parser can point at them
        if input.read_until(b'\n', &mut line)? == 0 {
            log::info!("end of input, leaving shell");
            writeln!(out)?;
            break;
        }

        let text = String::from_utf8_lossy(&line);
        let expression = text.trim();
        match expression {
            "quit" | "exit" => break,
            "" => {
                log::debug!("skipping empty line");
                continue;
            }
            _ => {}
        }

        if options.show_ast {
            if let Ok(expr) = Parser::new(None, expression).parse() {
                write!(out, "AST:\n{expr:#}")?;
            }
        }

        match compile_and_evaluate(None, expression) {
            Ok(result) => writeln!(out, "Result: {result}")?,
            Err(e) => {
                log::debug!("failed to evaluate `{expression}`: {e}");
                writeln!(err, "Compilation error: {e}")?;
                writeln!(err, "{e:?}")?;
            }
        }
        writeln!(out)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(input: &str, options: Options) -> (String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        run(input.as_bytes(), &mut out, &mut err, options).unwrap();
        (
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn examples_are_printed_first() {
        let (out, err) = session("", Options::default());
        assert!(out.contains("1/2 + 1/3 = 5/6 (≈ 0.8333333333333334)"));
        assert!(out.contains("4/2 - 1/3 = 5/3"));
        assert!(err.is_empty());
    }

    #[test]
    fn quit_stops_before_remaining_lines() {
        let options = Options {
            examples: false,
            ..Options::default()
        };
        let (out, _) = session("2 ^ 3\nquit\n1 + 1\n", options);
        assert!(out.contains("Result: 8 (≈ 8)"));
        assert!(!out.contains("Result: 2"));
    }

    #[test]
    fn errors_do_not_end_the_loop() {
        let options = Options {
            examples: false,
            ..Options::default()
        };
        let (out, err) = session("(1 + 2\n\n1/2 * 4\nexit\n", options);
        assert!(err.contains("Compilation error: Unmatched parenthesis"));
        assert!(out.contains("Result: 2 (≈ 2)"));
    }

    #[test]
    fn invalid_utf8_is_reported_like_any_bad_character() {
        let options = Options {
            examples: false,
            ..Options::default()
        };
        let mut out = Vec::new();
        let mut err = Vec::new();
        run(&b"1 + \xff\n2 ^ 3\nquit\n"[..], &mut out, &mut err, options).unwrap();

        let (out, err) = (
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        );
        assert!(err.contains("Compilation error: Unexpected character '\u{fffd}'"));
        assert!(out.contains("Result: 8 (≈ 8)"));
    }

    #[test]
    fn ast_is_shown_on_request() {
        let options = Options {
            examples: false,
            show_ast: true,
        };
        let (out, _) = session("1 + 2\n", options);
        assert!(out.contains("AST:\nBinaryOp: +\n  Number: 1\n  Number: 2\n"));
    }
}
