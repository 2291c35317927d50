use clap::Parser;
use negtone_cli::{run, Cli};
use tracing_subscriber::EnvFilter;

/// Log filter: `RUST_LOG` if set, otherwise warnings, or debug output from
/// the negtone crates with `--verbose`.
fn init_logging(verbose: bool) {
    let default_directive = if verbose {
        "warn,negtone_core=debug,negtone_cli=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(report) => {
            tracing::info!(decision = ?report.decision, "done");
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
