use std::path::PathBuf;
use std::process;

use clap::Parser;

/// Translates a stack-based VM program into Hack assembly.
#[derive(Parser, Debug)]
#[command(name = "vm-translator", version)]
struct Cli {
    /// Input VM program (one command per line, `//` comments allowed)
    input: PathBuf,
}

fn main() {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if err.use_stderr() {
                eprint!("{err}");
                process::exit(1);
            }
            // --help / --version
            print!("{err}");
            process::exit(0);
        }
    };

    if let Err(err) = vm_translator::run(&cli.input) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}
