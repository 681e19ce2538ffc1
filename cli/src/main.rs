use std::{
    error::Error,
    fs,
    io::{self, BufRead, Write},
    path::PathBuf,
    process::exit,
};

use clap::Parser;
use lox::{Diagnostics, Lox};

const EXIT_USAGE: i32 = 64;
const EXIT_NO_INPUT: i32 = 66;
const EXIT_IO_ERROR: i32 = 74;

type CliResult = Result<(), Box<dyn Error>>;

/// Evaluate Lox expressions from a script or an interactive prompt.
#[derive(Parser, Debug)]
#[command(name = "lox", version)]
struct Cli {
    /// Script to run. Starts an interactive prompt when omitted.
    script: Option<PathBuf>,

    /// Print the parsed syntax tree instead of evaluating it.
    #[arg(long)]
    print_ast: bool,
}

struct Runner {
    lox: Lox,
    diagnostics: Diagnostics,
    print_ast: bool,
}

impl Runner {
    fn new(print_ast: bool) -> Self {
        Runner {
            lox: Lox::default(),
            diagnostics: Diagnostics::with_sink(io::stderr()),
            print_ast,
        }
    }

    fn run_prompt(&mut self) -> CliResult {
        print!("> ");
        io::stdout().flush()?;

        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            self.run(&line?)?;
            // Every line is its own unit; an error must not stick around
            self.diagnostics.reset();

            print!("> ");
            io::stdout().flush()?;
        }

        println!();
        Ok(())
    }

    fn run(&mut self, source: &str) -> CliResult {
        let output = if self.print_ast {
            self.lox.print_ast(source, &mut self.diagnostics)
        } else {
            self.lox.run(source, &mut self.diagnostics)
        };

        if let Some(output) = output {
            writeln!(io::stdout(), "{}", output)?;
        }

        Ok(())
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            exit(if err.use_stderr() { EXIT_USAGE } else { 0 });
        }
    };

    let mut runner = Runner::new(cli.print_ast);
    match cli.script {
        Some(path) => {
            let source = match fs::read_to_string(&path) {
                Ok(source) => source,
                Err(err) => {
                    eprintln!("Could not read '{}': {}", path.display(), err);
                    exit(EXIT_NO_INPUT);
                }
            };

            if let Err(err) = runner.run(&source) {
                eprintln!("{}", err);
                exit(EXIT_IO_ERROR);
            }

            if let Some(code) = runner.diagnostics.exit_code() {
                exit(code);
            }
        }
        None => {
            if let Err(err) = runner.run_prompt() {
                eprintln!("{}", err);
                exit(EXIT_IO_ERROR);
            }
        }
    }
}
