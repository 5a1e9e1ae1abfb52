use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use fraction_calc::Evaluation;
use fraction_calc::Lexer;
use fraction_calc::LocatedEvalError;
use fraction_calc::repl;
use miette::IntoDiagnostic;
use miette::Report;
use miette::WrapErr;

#[derive(Parser, Debug)]
#[command(version, about = "Exact arithmetic on fractions")]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the tokens of the expression in a file
    Tokenize { filename: PathBuf },
    /// Print the syntax tree of the expression in a file
    Parse { filename: PathBuf },
    /// Evaluate the expression in a file
    Evaluate { filename: PathBuf },
    /// Evaluate an expression given on the command line
    Calc { expression: String },
    /// Start the interactive shell (the default)
    Repl {
        /// Skip the worked examples printed at startup
        #[arg(long)]
        no_examples: bool,
        /// Print the syntax tree before each result
        #[arg(long)]
        ast: bool,
    },
}

fn read(filename: &Path) -> miette::Result<String> {
    fs::read_to_string(filename)
        .into_diagnostic()
        .wrap_err_with(|| format!("reading `{}` failed", filename.display()))
}

fn main() -> miette::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    match args.command.unwrap_or(Commands::Repl {
        no_examples: false,
        ast: false,
    }) {
        Commands::Tokenize { filename } => {
            let file_contents = read(&filename)?;

            for token in Lexer::new(filename.to_str(), &file_contents) {
                let token = match token {
                    Ok(token) => token,
                    Err(e) => {
                        eprintln!("[line {}] Error: {e}", e.line());
                        eprintln!("{:?}", Report::new(e));
                        std::process::exit(65);
                    }
                };
                println!("{token}");
            }
            println!("EOF  null");
        }
        Commands::Parse { filename } => {
            let file_contents = read(&filename)?;

            match fraction_calc::Parser::new(filename.to_str(), &file_contents).parse() {
                Ok(expr) => println!("{expr}"),
                Err(e) => {
                    eprintln!("[line {}] Error: {e}", e.line());
                    eprintln!("{:?}", Report::new(e));
                    std::process::exit(65);
                }
            }
        }
        Commands::Evaluate { filename } => {
            let file_contents = read(&filename)?;

            let expr = match fraction_calc::Parser::new(filename.to_str(), &file_contents).parse()
            {
                Ok(expr) => expr,
                Err(e) => {
                    eprintln!("[line {}] Error: {e}", e.line());
                    eprintln!("{:?}", Report::new(e));
                    std::process::exit(65);
                }
            };
            match expr.evaluate() {
                Ok(value) => println!("{}", Evaluation::from(value)),
                Err(e) => {
                    let e = LocatedEvalError::new(e, filename.to_str(), &file_contents);
                    eprintln!("{:?}", Report::new(e));
                    std::process::exit(70);
                }
            }
        }
        Commands::Calc { expression } => {
            let result = fraction_calc::compile_and_evaluate(None, &expression)?;
            println!("{result}");
        }
        Commands::Repl { no_examples, ast } => {
            let options = repl::Options {
                examples: !no_examples,
                show_ast: ast,
            };
            repl::run(io::stdin().lock(), &mut io::stdout(), &mut io::stderr(), options)
                .into_diagnostic()
                .wrap_err("shell I/O failed")?;
        }
    }
    Ok(())
}
