use cuentas::cli::{run_cli, CliOptions};

fn main() {
    // Tracing starts once the shell has read the configured log filter.
    if let Err(err) = CliOptions::from_args(std::env::args().skip(1)).and_then(run_cli) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
