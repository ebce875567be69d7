use clap::Parser;
use jscore::{Config, EngineError, Interpreter, JsValue};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "jscore", version, about = "Evaluation core for a small scripting language")]
struct Cli {
    /// Script file to execute
    file: Option<PathBuf>,

    /// Evaluate inline code
    #[arg(short = 'e', long = "eval")]
    eval: Option<String>,

    /// Do not install assert, assert_throws and println
    #[arg(long)]
    no_harness: bool,

    /// Maximum nested calls before a RangeError
    #[arg(long = "max-depth", value_name = "N")]
    max_depth: Option<usize>,

    /// Treat global code as strict
    #[arg(long)]
    strict: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config {
            harness: !self.no_harness,
            strict: self.strict,
            ..Config::default()
        };
        if let Some(depth) = self.max_depth {
            config.max_call_depth = depth;
        }
        config
    }
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn report(err: &EngineError) -> u8 {
    eprintln!("{err}");
    err.exit_code()
}

fn execute_code(interp: &mut Interpreter, code: &str) -> u8 {
    match interp.eval_source(code) {
        Ok(_) => 0,
        Err(e) => report(&e),
    }
}

fn run_file(interp: &mut Interpreter, path: &Path) -> u8 {
    match std::fs::read_to_string(path) {
        Ok(source) => execute_code(interp, &source),
        Err(e) => {
            eprintln!("Error reading {}: {e}", path.display());
            EngineError::Io(e).exit_code()
        }
    }
}

fn run_repl(interp: &mut Interpreter) -> u8 {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    println!("jscore v{}", env!("CARGO_PKG_VERSION"));
    println!("Type statements to evaluate. Press Ctrl-D to exit.");

    loop {
        print!("> ");
        if stdout.flush().is_err() {
            break;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match interp.eval_source(trimmed) {
                    Ok(JsValue::Undefined) => {}
                    Ok(v) => println!("{}", interp.value_to_display(&v)),
                    Err(e) => eprintln!("{e}"),
                }
            }
            Err(e) => {
                eprintln!("Read error: {e}");
                return 2;
            }
        }
    }
    println!();
    0
}

fn run(cli: Cli) -> u8 {
    let mut interp = Interpreter::with_config(cli.config());
    if let Some(code) = &cli.eval {
        return execute_code(&mut interp, code);
    }
    if let Some(path) = &cli.file {
        return run_file(&mut interp, path);
    }
    run_repl(&mut interp)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    ExitCode::from(run(cli))
}
