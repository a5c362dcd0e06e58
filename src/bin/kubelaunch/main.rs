use clap::Parser;
use commands::handle_commands;
use kubelaunch::config::load_config;
use std::process::ExitCode;

mod cli;
mod commands;
mod help;

#[tokio::main]
async fn main() -> ExitCode {
    match real_main().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:?}");
            ExitCode::from(1)
        }
    }
}

async fn real_main() -> anyhow::Result<()> {
    let args = cli::KubeLaunch::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(args.verbosity)
        .init();

    let config = load_config(args.config.as_ref())?;
    handle_commands(&config, args.command).await
}
