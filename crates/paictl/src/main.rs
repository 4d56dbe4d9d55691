use anyhow::Result;
use clap::Parser;
use pai_core::Config;
use tracing::{debug, error, info, trace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod connection;
mod error;
mod output;

use cli::{Cli, Commands};
use connection::ConnectionManager;
use error::PaictlError;
use output::OutputFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let mut conn_mgr = match load_connection_manager(cli.config_file.as_deref()) {
        Ok(conn_mgr) => conn_mgr,
        Err(e) => {
            e.print_diagnostic();
            std::process::exit(1);
        }
    };

    if let Err(e) = execute_command(&cli, &mut conn_mgr).await {
        e.print_diagnostic();
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    // RUST_LOG wins over -v
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "paictl=warn,pai_core=warn",
            1 => "paictl=info,pai_core=info",
            2 => "paictl=debug,pai_core=debug",
            _ => "paictl=trace,pai_core=trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

fn load_connection_manager(config_file: Option<&str>) -> Result<ConnectionManager, PaictlError> {
    let (config, config_path) = match config_file {
        Some(config_file) => {
            let path = std::path::PathBuf::from(config_file);
            debug!("Loading config from explicit path: {:?}", path);
            (Config::load_from_path(&path)?, Some(path))
        }
        None => {
            debug!("Loading config from default location");
            (Config::load()?, None)
        }
    };
    Ok(ConnectionManager::with_config_path(config, config_path))
}

async fn execute_command(cli: &Cli, conn_mgr: &mut ConnectionManager) -> Result<(), PaictlError> {
    trace!("Executing command: {:?}", cli.command);
    info!("Command: {}", format_command(&cli.command));

    let profile = cli.profile.as_deref();
    let format = cli.output;

    let start = std::time::Instant::now();
    let result = match &cli.command {
        Commands::Version => {
            debug!("Showing version information");
            match format {
                OutputFormat::Json | OutputFormat::Yaml => {
                    let data = serde_json::json!({
                        "version": env!("CARGO_PKG_VERSION"),
                        "name": env!("CARGO_PKG_NAME"),
                    });
                    output::print_output(&data, format)
                }
                OutputFormat::Table => {
                    println!("paictl {}", env!("CARGO_PKG_VERSION"));
                    Ok(())
                }
            }
        }
        Commands::Profile(cmd) => {
            commands::profile::handle_profile_command(cmd, conn_mgr, format).await
        }
        Commands::Workspace(cmd) => {
            commands::workspace::handle_workspace_command(cmd, conn_mgr, profile, format).await
        }
        Commands::Dataset(cmd) => {
            commands::dataset::handle_dataset_command(cmd, conn_mgr, profile, format).await
        }
        Commands::Model(cmd) => {
            commands::model::handle_model_command(cmd, conn_mgr, profile, format).await
        }
        Commands::Image(cmd) => {
            commands::image::handle_image_command(cmd, conn_mgr, profile, format).await
        }
        Commands::Pipeline(cmd) => {
            commands::pipeline::handle_pipeline_command(cmd, conn_mgr, profile, format).await
        }
        Commands::Run(cmd) => commands::run::handle_run_command(cmd, conn_mgr, profile, format).await,
        Commands::Job(cmd) => commands::job::handle_job_command(cmd, conn_mgr, profile, format).await,
        Commands::Service(cmd) => {
            commands::service::handle_service_command(cmd, conn_mgr, profile, format).await
        }
    };

    let duration = start.elapsed();
    match &result {
        Ok(_) => info!("Command completed successfully in {:?}", duration),
        Err(e) => error!("Command failed after {:?}: {}", duration, e),
    }

    result
}

/// Command line for log output, with credentials redacted
fn format_command(command: &Commands) -> String {
    match command {
        Commands::Version => "version".to_string(),
        Commands::Profile(cmd) => {
            use cli::ProfileCommands::*;
            match cmd {
                List => "profile list".to_string(),
                Path => "profile path".to_string(),
                Show { name } => format!("profile show {}", name),
                Set { name, .. } => format!("profile set {} [credentials redacted]", name),
                Remove { name } => format!("profile remove {}", name),
                Default { name } => format!("profile default {}", name),
            }
        }
        Commands::Workspace(cmd) => format!("workspace {:?}", cmd),
        Commands::Dataset(cmd) => format!("dataset {:?}", cmd),
        Commands::Model(cmd) => format!("model {:?}", cmd),
        Commands::Image(cmd) => format!("image {:?}", cmd),
        Commands::Pipeline(cmd) => format!("pipeline {:?}", cmd),
        Commands::Run(cmd) => format!("run {:?}", cmd),
        Commands::Job(cmd) => format!("job {:?}", cmd),
        Commands::Service(cmd) => format!("service {:?}", cmd),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_command_redacts_profile_secrets() {
        let cli = Cli::parse_from([
            "paictl",
            "profile",
            "set",
            "prod",
            "--access-key-id",
            "LTAI-visible",
            "--access-key-secret",
            "top-secret",
        ]);
        let line = format_command(&cli.command);
        assert_eq!(line, "profile set prod [credentials redacted]");
        assert!(!line.contains("top-secret"));
    }
}
