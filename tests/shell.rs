use fraction_calc::{ErrorKind, compile_and_evaluate, error_kind, repl};

fn run(input: &str) -> (String, String) {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let options = repl::Options {
        examples: false,
        show_ast: false,
    };
    repl::run(input.as_bytes(), &mut out, &mut err, options).unwrap();
    (
        String::from_utf8(out).unwrap(),
        String::from_utf8(err).unwrap(),
    )
}

#[test]
fn session_survives_every_kind_of_failure() {
    let (out, err) = run("1/0\n1 + @\n(1 + 2\n2 ^ (1/2)\n(1/2 + 1/3) * 3/4\n");

    assert!(err.contains("Compilation error: Division by zero in numeric literal"));
    assert!(err.contains("Compilation error: Unexpected character '@'"));
    assert!(err.contains("Compilation error: Unmatched parenthesis"));
    assert!(err.contains("Compilation error: Exponent 1/2 is not a whole number"));
    assert!(out.contains("Result: 5/8 (≈ 0.625)"));
}

#[test]
fn oversized_expressions_are_reported_and_the_shell_goes_on() {
    let chain = format!("{}1", "1+".repeat(5_000));
    let nested = format!("{}1{}", "(".repeat(5_000), ")".repeat(5_000));
    let (out, err) = run(&format!("{chain}\n{nested}\n2 ^ 3\n"));

    assert_eq!(err.matches("Compilation error: Expression nests deeper").count(), 2);
    assert!(out.contains("Result: 8 (≈ 8)"));

    let report = compile_and_evaluate(None, &chain).unwrap_err();
    assert_eq!(error_kind(&report), Some(ErrorKind::TooDeep));
}

#[test]
fn end_of_input_leaves_the_shell() {
    let (out, err) = run("2 ^ 3");
    assert!(out.contains("Result: 8 (≈ 8)"));
    assert!(err.is_empty());
}

#[test]
fn exact_results_are_canonical() {
    let cases = [
        ("1/2 + 1/4 * 2", "1"),
        ("2 ^ 3", "8"),
        ("(1/2 + 1/3) * 3/4", "5/8"),
        ("4/2 - 1/3", "5/3"),
        ("6/8", "3/4"),
        ("-6/8 * -1", "3/4"),
        ("1/3 - 1/2", "-1/6"),
    ];
    for (source, expected) in cases {
        for _ in 0..2 {
            let result = compile_and_evaluate(None, source).unwrap();
            assert_eq!(result.exact.to_string(), expected, "{source}");
        }
    }
}

#[test]
fn failures_keep_their_kind() {
    let cases = [
        ("(1 + 2", ErrorKind::UnmatchedParenthesis),
        ("1 + @", ErrorKind::UnexpectedCharacter),
        ("1/0", ErrorKind::DivisionByZero),
        ("1 +", ErrorKind::UnexpectedCharacter),
        ("3/ 4", ErrorKind::MalformedNumber),
        ("2 ^ 100", ErrorKind::ArithmeticOverflow),
    ];
    for (source, kind) in cases {
        let report = compile_and_evaluate(Some("test"), source).unwrap_err();
        assert_eq!(error_kind(&report), Some(kind), "{source}");
    }
}
