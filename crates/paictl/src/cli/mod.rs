//! CLI structure and command definitions
//!
//! Top-level flags and commands live here; the per-resource command trees are in
//! [`resources`].

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use pai_core::pagination::DEFAULT_PAGE_SIZE;
use pai_core::progress::{DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT};
use pai_core::{ListOptions, Product, SortOrder};

pub mod resources;

pub use resources::*;

use crate::output::OutputFormat;

/// Command-line client for Alibaba Cloud Platform for AI
#[derive(Parser, Debug)]
#[command(name = "paictl")]
#[command(version, about = "Command-line client for Alibaba Cloud PAI")]
#[command(long_about = "
Command-line client for Alibaba Cloud Platform for AI (PAI)

Manage workspaces, datasets, models, images, training jobs, pipelines and
EAS inference services from one tool.

EXAMPLES:
    # Set up a profile
    paictl profile set default --access-key-id LTAI... --access-key-secret ... \\
        --region-id cn-hangzhou --workspace-id 12345

    # List running services as JSON
    paictl service list --status Running -o json

    # Deploy a service and wait until it runs
    paictl service create --config service.json --wait

    # Follow a training job
    paictl job wait dlc-1a2b3c

For more help on a specific command, run:
    paictl <command> --help
")]
pub struct Cli {
    /// Profile to use for this command
    #[arg(long, short, global = true, env = "PAICTL_PROFILE")]
    pub profile: Option<String>,

    /// Path to alternate configuration file
    #[arg(long, global = true, env = "PAICTL_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "table")]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Profile management
    #[command(subcommand, visible_alias = "prof")]
    #[command(after_help = "EXAMPLES:
    # Create a profile and make it the default
    paictl profile set prod --access-key-id LTAI... --access-key-secret ... --default

    # Point EAS at a VPC endpoint
    paictl profile set prod --access-key-id LTAI... --access-key-secret ... \\
        --endpoint eas=https://pai-eas-vpc.cn-hangzhou.aliyuncs.com

    # Keep secrets out of the file
    paictl profile set ci --access-key-id '${AK_ID}' --access-key-secret '${AK_SECRET}'
")]
    Profile(ProfileCommands),

    /// AI workspaces
    #[command(subcommand, visible_alias = "ws")]
    Workspace(WorkspaceCommands),

    /// Registered datasets
    #[command(subcommand, visible_alias = "ds")]
    Dataset(DatasetCommands),

    /// Registered models and their versions
    #[command(subcommand)]
    Model(ModelCommands),

    /// Container images
    #[command(subcommand)]
    Image(ImageCommands),

    /// Pipeline definitions
    #[command(subcommand)]
    Pipeline(PipelineCommands),

    /// Pipeline runs
    #[command(subcommand)]
    Run(RunCommands),

    /// DLC training jobs
    #[command(subcommand)]
    Job(JobCommands),

    /// EAS inference services
    #[command(subcommand, visible_alias = "svc")]
    Service(ServiceCommands),

    /// Version information
    #[command(visible_alias = "ver")]
    Version,
}

/// Profile management commands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// List all configured profiles
    #[command(visible_alias = "ls")]
    List,

    /// Show the path to the configuration file
    Path,

    /// Show details of a specific profile
    #[command(visible_alias = "get")]
    Show {
        /// Profile name to show
        name: String,
    },

    /// Set or create a profile
    #[command(visible_alias = "add")]
    Set {
        /// Profile name
        name: String,

        /// AccessKey id (or `keyring:<key>` / `${VAR}`)
        #[arg(long)]
        access_key_id: String,

        /// AccessKey secret (or `keyring:<key>` / `${VAR}`)
        #[arg(long)]
        access_key_secret: String,

        /// STS security token
        #[arg(long)]
        security_token: Option<String>,

        /// Region id
        #[arg(long, default_value = pai_core::config::DEFAULT_REGION)]
        region_id: String,

        /// Default workspace id
        #[arg(long)]
        workspace_id: Option<String>,

        /// Endpoint override as PRODUCT=URL (aiworkspace, dlc, paiflow, eas)
        #[arg(long = "endpoint", value_parser = parse_endpoint)]
        endpoints: Vec<(Product, String)>,

        /// HTTP request timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Make this the default profile
        #[arg(long)]
        default: bool,

        /// Store the secret and security token in the OS keyring instead of the config file
        #[cfg(feature = "secure-storage")]
        #[arg(long)]
        use_keyring: bool,
    },

    /// Remove a profile
    #[command(visible_alias = "rm")]
    Remove {
        /// Profile name to remove
        name: String,
    },

    /// Set the default profile
    Default {
        /// Profile name to use by default
        name: String,
    },
}

/// Paging flags shared by list commands
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Items per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,

    /// Field to sort by
    #[arg(long)]
    pub sort_by: Option<String>,

    /// Sort direction
    #[arg(long, value_enum, requires = "sort_by")]
    pub order: Option<SortOrder>,

    /// Fetch every page instead of one
    #[arg(long)]
    pub all: bool,
}

impl ListArgs {
    pub fn options(&self) -> ListOptions {
        ListOptions {
            page_number: self.page.max(1),
            page_size: self.page_size.max(1),
            sort_by: self.sort_by.clone(),
            order: self.order,
        }
    }
}

/// Polling flags shared by wait commands
#[derive(Args, Debug, Clone)]
pub struct WaitArgs {
    /// Give up after this many seconds
    #[arg(long, default_value_t = DEFAULT_WAIT_TIMEOUT.as_secs())]
    pub timeout: u64,

    /// Seconds between status checks
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_secs())]
    pub interval: u64,
}

impl WaitArgs {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval.max(1))
    }
}

/// Parse `PRODUCT=URL`
fn parse_endpoint(s: &str) -> Result<(Product, String), String> {
    let (product, url) = s
        .split_once('=')
        .ok_or_else(|| format!("expected PRODUCT=URL, got '{}'", s))?;
    let product = <Product as ValueEnum>::from_str(product, true).map_err(|_| {
        format!(
            "unknown product '{}' (valid: aiworkspace, dlc, paiflow, eas)",
            product
        )
    })?;
    if url.is_empty() {
        return Err("endpoint URL is empty".to_string());
    }
    Ok((product, url.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_endpoint() {
        assert_eq!(
            parse_endpoint("EAS=http://localhost:8080").unwrap(),
            (Product::Eas, "http://localhost:8080".to_string())
        );
        assert!(parse_endpoint("oss=http://x").is_err());
        assert!(parse_endpoint("eas").is_err());
        assert!(parse_endpoint("eas=").is_err());
    }

    #[test]
    fn test_list_args_to_options() {
        let cli = Cli::parse_from([
            "paictl",
            "dataset",
            "list",
            "--page",
            "3",
            "--page-size",
            "50",
            "--sort-by",
            "GmtCreateTime",
            "--order",
            "desc",
        ]);
        let Commands::Dataset(DatasetCommands::List { list, .. }) = cli.command else {
            panic!("expected dataset list");
        };
        let options = list.options();
        assert_eq!(options.page_number, 3);
        assert_eq!(options.page_size, 50);
        assert_eq!(options.order, Some(SortOrder::Desc));
    }

    #[test]
    fn test_run_create_needs_one_source() {
        assert!(Cli::try_parse_from(["paictl", "run", "create"]).is_err());
        assert!(
            Cli::try_parse_from([
                "paictl",
                "run",
                "create",
                "--pipeline-id",
                "p-1",
                "--manifest",
                "m.yaml"
            ])
            .is_err()
        );
        assert!(Cli::try_parse_from(["paictl", "run", "create", "--pipeline-id", "p-1"]).is_ok());
    }
}
