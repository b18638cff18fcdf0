use barangay_media::cli::{Cli, Commands};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "barangay_media=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { host, port }) => {
            barangay_media::cli::serve::run(&cli.config, host, port).await?;
        }
        Some(Commands::Migrate { command }) => {
            barangay_media::cli::migrate::run(&cli.config, command).await?;
        }
        Some(Commands::Resolve { reference, buckets }) => {
            barangay_media::cli::resolve::run(&cli.config, &reference, buckets).await?;
        }
        Some(Commands::List { user, admin, json }) => {
            barangay_media::cli::list::run(&cli.config, user, admin, json).await?;
        }
        Some(Commands::Sign {
            reference,
            download,
        }) => {
            barangay_media::cli::sign::run(&cli.config, &reference, download).await?;
        }
        Some(Commands::Backfill { dry_run }) => {
            barangay_media::cli::backfill::run(&cli.config, dry_run).await?;
        }
        Some(Commands::Buckets) => {
            barangay_media::cli::buckets::run(&cli.config).await?;
        }
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
        }
    }

    Ok(())
}
