use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

use venbaah::cli::{Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    venbaah::logging::init().context("init logging")?;

    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        Command::Serve(args) => {
            let config = venbaah::config::Config::from_args(args).context("load config")?;
            tracing::info!(?config, "starting venbaah");
            venbaah::app::serve(config).await.context("serve")?;
        }
        Command::InitDb(args) => {
            venbaah::maintenance::init_db(args).context("init-db")?;
        }
        Command::PruneUploads(args) => {
            venbaah::maintenance::prune_uploads(args)
                .await
                .context("prune-uploads")?;
        }
    }

    Ok(())
}
