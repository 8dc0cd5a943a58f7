//! Fieldscript CLI entry point.

use fieldscript_runtime::{Repl, demo_script};
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// CLI configuration parsed from arguments.
#[derive(Default)]
struct CliConfig {
    files: Vec<PathBuf>,
    batch_mode: bool,
    disasm: bool,
    show_help: bool,
    show_version: bool,
    trace: bool,
    ticks: Option<u64>,
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<CliConfig, Box<dyn std::error::Error>> {
    let mut config = CliConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => config.show_help = true,
            "-V" | "--version" => config.show_version = true,
            "-b" | "--batch" => config.batch_mode = true,
            "-d" | "--disasm" => config.disasm = true,
            "--trace" => config.trace = true,
            "--ticks" => {
                i += 1;
                if i >= args.len() {
                    return Err("--ticks requires a value".into());
                }
                config.ticks = Some(
                    args[i]
                        .parse()
                        .map_err(|_| format!("invalid --ticks value: {}", args[i]))?,
                );
            }
            arg if arg.starts_with('-') => {
                return Err(format!("unknown option: {arg}").into());
            }
            path => config.files.push(PathBuf::from(path)),
        }
        i += 1;
    }

    Ok(config)
}

/// Command files hold REPL lines; everything else is script bytecode.
fn is_command_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "fsc")
}

fn run(args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = parse_args(args)?;

    if config.show_help {
        print_help();
        return Ok(());
    }

    if config.show_version {
        println!("fieldscript {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let mut repl = Repl::new()?;
    repl.session_mut().load_script("demo", demo_script()?)?;
    if config.trace {
        repl.eval("trace on")?;
    }

    for file in &config.files {
        if is_command_file(file) {
            let output = repl.eval_file(file)?;
            print!("{output}");
        } else {
            let program = repl.session_mut().load_script_file(file)?;
            if config.disasm {
                print!("{}", repl.session().disassemble(program.name())?);
            }
        }
    }

    if config.disasm {
        return Ok(());
    }

    if let Some(ticks) = config.ticks {
        if let Some(output) = repl.eval(&format!("tick {ticks}"))? {
            println!("{output}");
        }
    }

    if config.batch_mode {
        return Ok(());
    }

    // Loaded files establish context; skip the banner.
    if !config.files.is_empty() {
        repl = repl.without_banner();
    }

    repl.run()?;
    Ok(())
}

fn print_help() {
    println!(
        "\x1b[1mFieldscript\x1b[0m - field-script bytecode engine

\x1b[1mUSAGE:\x1b[0m
    fieldscript [OPTIONS] [FILES...]

\x1b[1mARGUMENTS:\x1b[0m
    [FILES...]    Script bytecode to load, or .fsc command files to run

\x1b[1mOPTIONS:\x1b[0m
    -h, --help         Print help information
    -V, --version      Print version information
    -b, --batch        Load files, run --ticks, and exit (no REPL)
    -d, --disasm       Print a listing of each script file and exit
    --ticks N          Run N frames after loading files
    --trace            Echo trace records to stderr

\x1b[1mEXAMPLES:\x1b[0m
    fieldscript                          Start interactive REPL
    fieldscript -d door.bin              Show door.bin's instructions
    fieldscript -b --ticks 60 setup.fsc  Run a command file for 60 frames
    fieldscript --trace door.bin         Load door.bin with tracing on

\x1b[1mREPL:\x1b[0m
    A script named 'demo' is always loaded. Type 'help' inside the REPL
    for the command list. Ctrl+D exits."
    );
}
