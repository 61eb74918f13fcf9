use clap::Parser;
use tracing_subscriber::EnvFilter;

mod args;
mod cmd;
mod context;
mod output;

#[tokio::main]
async fn main() {
    let cli = args::Cli::parse();
    output::init(cli.json);
    init_tracing(cli.json);

    if let Err(err) = cmd::dispatch(cli).await {
        output::report_error(&err);
        std::process::exit(output::exit_code(&err));
    }
}

/// Logs go to stderr so stdout stays machine-readable. `RUST_LOG` wins over
/// the default `ogal=info`.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ogal=info,warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}
