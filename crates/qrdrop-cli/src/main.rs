use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_logging(cli.debug, cli.production);
    commands::run_command(cli)
}

/// `RUST_LOG` wins over `--debug` when set.
fn init_logging(debug: bool, production: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(debug)));
    let registry = tracing_subscriber::registry().with(filter);
    if production {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn default_filter(debug: bool) -> &'static str {
    if debug {
        concat!(
            "qrdrop=debug,qrdrop_server=debug,qrdrop_store=debug,",
            "qrdrop_gate=debug,qrdrop_render=debug,tower_http=debug"
        )
    } else {
        "info,tower_http=info"
    }
}
