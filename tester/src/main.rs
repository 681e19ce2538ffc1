use std::{
    fs::File,
    io::{self, BufRead},
    path::{Path, PathBuf},
    process::{exit, Command},
};

use clap::Parser;
use console::{style, Term};
use glob::glob;
use regex::Regex;

/// Runs the sample scripts against the interpreter binary and checks their
/// `// expect` annotations.
#[derive(Parser, Debug)]
#[command(name = "lox-tester", version)]
struct Args {
    /// Only run samples whose path below the samples directory starts with this.
    filter: Option<String>,

    /// Interpreter binary to test.
    #[arg(long, default_value = "./target/release/lox-cli")]
    binary: PathBuf,

    /// Directory holding the `.lox` samples.
    #[arg(long, default_value = "samples")]
    samples: PathBuf,
}

struct Patterns {
    expected_output: Regex,
    expected_error: Regex,
    error_line: Regex,
    expected_runtime_error: Regex,
    syntax_error: Regex,
    non_test: Regex,
}

impl Patterns {
    fn new() -> Result<Self, regex::Error> {
        Ok(Patterns {
            expected_output: Regex::new(r"// expect: ?(.*)")?,
            expected_error: Regex::new(r"// (Error.*)")?,
            error_line: Regex::new(r"// \[line (\d+)\] (Error.*)")?,
            expected_runtime_error: Regex::new(r"// expect runtime error: (.+)")?,
            syntax_error: Regex::new(r"\[line (\d+)\] (Error.+)")?,
            non_test: Regex::new(r"// nontest")?,
        })
    }
}

struct ExpectedOutput {
    line: usize,
    output: String,
}

impl ExpectedOutput {
    pub fn new(line: usize, output: String) -> Self {
        ExpectedOutput { line, output }
    }
}

struct Test {
    path: PathBuf,
    expected_output: Vec<ExpectedOutput>,
    expected_errors: Vec<String>,
    expected_exit_code: i32,
    expected_runtime_error: Option<String>,
    expectations: u32,
}

impl Test {
    fn new(path: PathBuf) -> Self {
        Test {
            path,
            expected_output: Vec::new(),
            expected_errors: Vec::new(),
            expected_exit_code: 0,
            expected_runtime_error: None,
            expectations: 0,
        }
    }

    /// Reads the annotations. Returns `Ok(false)` if the file is not a test.
    fn parse(&mut self, patterns: &Patterns) -> io::Result<bool> {
        for (index, line) in read_lines(&self.path)?.enumerate() {
            let line = line?;
            let line_num = index + 1;

            // Not a test file at all, so ignore it.
            if patterns.non_test.is_match(&line) {
                return Ok(false);
            }

            if let Some(captures) = patterns.expected_output.captures(&line) {
                self.expected_output
                    .push(ExpectedOutput::new(line_num, captures[1].to_string()));
                self.expectations += 1;
                continue;
            }

            if let Some(captures) = patterns.error_line.captures(&line) {
                self.expected_errors
                    .push(format!("[line {}] {}", &captures[1], &captures[2]));
                self.expected_exit_code = 65;
                self.expectations += 1;
                continue;
            }

            if let Some(captures) = patterns.expected_error.captures(&line) {
                self.expected_errors
                    .push(format!("[line {}] {}", line_num, &captures[1]));
                self.expected_exit_code = 65;
                self.expectations += 1;
                continue;
            }

            if let Some(captures) = patterns.expected_runtime_error.captures(&line) {
                self.expected_runtime_error =
                    Some(format!("[line {}] Error: {}", line_num, &captures[1]));
                self.expected_exit_code = 70;
                self.expectations += 1;
                continue;
            }
        }

        if !self.expected_errors.is_empty() && self.expected_runtime_error.is_some() {
            println!(
                "{}: {}\n\t{}",
                style("TEST ERROR").magenta(),
                self.path.display(),
                style("Cannot expect both compile and runtime errors.").red()
            );
            return Ok(false);
        }

        Ok(true)
    }

    fn run(&self, binary: &Path, patterns: &Patterns) -> io::Result<Vec<String>> {
        let mut failures = Vec::new();

        let result = Command::new(binary).arg(&self.path).output()?;
        let stdout = String::from_utf8_lossy(&result.stdout);
        let stderr = String::from_utf8_lossy(&result.stderr);

        let mut error_lines = stderr.lines();
        if let Some(runtime_error) = &self.expected_runtime_error {
            // Validate runtime errors
            match error_lines.next() {
                Some(error) if error == runtime_error => (),
                Some(error) => failures.push(format!(
                    "Expected runtime error '{}' and got:\n{}",
                    runtime_error, error
                )),
                None => failures.push(format!(
                    "Expected runtime error '{}' and got none.",
                    runtime_error
                )),
            }
        } else {
            failures.extend(self.compile_error_failures(error_lines, patterns));
        }

        // Validate exit code
        if result.status.code() != Some(self.expected_exit_code) {
            failures.push(format!(
                "Expected return code {} and got {:?}.",
                self.expected_exit_code,
                result.status.code()
            ));
        }

        // Validate output
        let output_lines: Vec<&str> = stdout.lines().collect();
        for (index, line) in output_lines.iter().enumerate() {
            match self.expected_output.get(index) {
                None => failures.push(format!("Got output '{}' when none was expected.", line)),
                Some(expected) if expected.output != *line => failures.push(format!(
                    "Expected output '{}' on line {} and got '{}'.",
                    expected.output, expected.line, line
                )),
                Some(_) => (),
            }
        }
        for expected in self.expected_output.iter().skip(output_lines.len()) {
            failures.push(format!(
                "Missing expected output '{}' on line {}.",
                expected.output, expected.line
            ));
        }

        Ok(failures)
    }

    // Each expected error is matched at most once so repeated errors on a
    // line are counted.
    fn compile_error_failures<'a>(
        &self,
        error_lines: impl Iterator<Item = &'a str>,
        patterns: &Patterns,
    ) -> Vec<String> {
        let mut failures = Vec::new();
        let mut missing_errors = self.expected_errors.clone();
        let mut unexpected_count = 0;
        for line in error_lines {
            if let Some(captures) = patterns.syntax_error.captures(line) {
                let error = format!("[line {}] {}", &captures[1], &captures[2]);
                if let Some(index) = missing_errors.iter().position(|e| *e == error) {
                    missing_errors.remove(index);
                } else {
                    if unexpected_count < 10 {
                        failures.push(format!("Unexpected error:\n{}", line));
                    }
                    unexpected_count += 1;
                }
            } else if !line.is_empty() {
                if unexpected_count < 10 {
                    failures.push(format!("Unexpected output on stderr:\n{}", line));
                }
                unexpected_count += 1;
            }
        }

        if unexpected_count > 10 {
            failures.push(format!("(truncated {} more...)", unexpected_count - 10));
        }

        // Validate that every expected error occurred.
        for error in &missing_errors {
            failures.push(format!("Missing expected error: {}", error));
        }

        failures
    }
}

struct Tester {
    args: Args,
    patterns: Patterns,
    passed: u32,
    failed: u32,
    skipped: u32,
    expectations: u32,
}

impl Tester {
    fn new(args: Args, patterns: Patterns) -> Self {
        Tester {
            args,
            patterns,
            passed: 0,
            failed: 0,
            skipped: 0,
            expectations: 0,
        }
    }

    fn run_suite(&mut self) -> io::Result<bool> {
        let term = Term::stdout();

        let pattern = self.args.samples.join("**").join("*.lox");
        let paths = glob(&pattern.to_string_lossy())
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;

        // Placeholder for the progress line
        term.write_line("")?;
        for path in paths {
            let path = path.map_err(|err| err.into_error())?;
            self.run_test(&term, path)?;
        }
        term.clear_last_lines(1)?;

        if self.failed == 0 {
            println!(
                "All {} tests passed ({} expectations).",
                style(self.passed).green(),
                self.expectations
            );
        } else {
            println!(
                "{} tests passed. {} tests failed.",
                style(self.passed).green(),
                style(self.failed).red()
            );
        }

        Ok(self.failed == 0)
    }

    fn run_test(&mut self, term: &Term, path: PathBuf) -> io::Result<()> {
        // Check if we are just running a subset of the tests.
        if let Some(filter) = &self.args.filter {
            let relative = pathdiff::diff_paths(&path, &self.args.samples).unwrap_or_default();
            if !relative.to_string_lossy().starts_with(filter.as_str()) {
                return Ok(());
            }
        }

        term.clear_last_lines(1)?;
        term.write_line(&format!(
            "Passed: {} Failed: {} Skipped: {} ({})",
            style(self.passed).green(),
            style(self.failed).red(),
            style(self.skipped).yellow(),
            style(path.display())
        ))?;

        let mut test = Test::new(path);
        if !test.parse(&self.patterns)? {
            self.skipped += 1;
            return Ok(());
        }
        self.expectations += test.expectations;

        let failures = test.run(&self.args.binary, &self.patterns)?;
        if failures.is_empty() {
            self.passed += 1;
        } else {
            self.failed += 1;
            term.clear_last_lines(1)?;
            println!("{}: {}", style("FAIL").red(), test.path.display());
            println!();
            for failure in &failures {
                println!("\t{}", style(failure).blue());
            }
            println!();
            // Fresh line for the progress output to overwrite
            term.write_line("")?;
        }

        Ok(())
    }
}

fn main() -> io::Result<()> {
    let args = Args::parse();
    let patterns =
        Patterns::new().map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;

    let mut tester = Tester::new(args, patterns);
    if !tester.run_suite()? {
        exit(1);
    }

    Ok(())
}

// Returns an iterator over the lines of the file.
fn read_lines<P>(filename: P) -> io::Result<io::Lines<io::BufReader<File>>>
where
    P: AsRef<Path>,
{
    let file = File::open(filename)?;
    Ok(io::BufReader::new(file).lines())
}
