//! Resource command trees

use clap::{ArgGroup, Subcommand};

use super::{ListArgs, WaitArgs};

#[derive(Subcommand, Debug)]
pub enum WorkspaceCommands {
    /// List workspaces
    #[command(visible_alias = "ls")]
    List {
        /// Filter by workspace name
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        list: ListArgs,
    },

    /// Show a workspace (defaults to the profile's workspace)
    Get { workspace_id: Option<String> },

    /// List members of a workspace (defaults to the profile's workspace)
    Members {
        workspace_id: Option<String>,

        /// Only members holding this role
        #[arg(long)]
        role: Vec<String>,

        #[command(flatten)]
        list: ListArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum DatasetCommands {
    /// List datasets
    #[command(visible_alias = "ls")]
    List {
        /// Workspace to list (defaults to the profile's workspace)
        #[arg(long)]
        workspace_id: Option<String>,

        /// Filter by dataset name
        #[arg(long)]
        name: Option<String>,

        /// Filter by data source type (OSS, NAS)
        #[arg(long)]
        source_type: Vec<String>,

        #[command(flatten)]
        list: ListArgs,
    },

    /// Show a dataset
    Get { dataset_id: String },

    /// Delete a dataset
    #[command(visible_alias = "rm")]
    Delete { dataset_id: String },
}

#[derive(Subcommand, Debug)]
pub enum ModelCommands {
    /// List models
    #[command(visible_alias = "ls")]
    List {
        /// Workspace to list (defaults to the profile's workspace)
        #[arg(long)]
        workspace_id: Option<String>,

        /// Filter by model name
        #[arg(long)]
        name: Option<String>,

        /// Filter by domain, e.g. nlp or cv
        #[arg(long)]
        domain: Option<String>,

        /// Filter by task, e.g. text-classification
        #[arg(long)]
        task: Option<String>,

        #[command(flatten)]
        list: ListArgs,
    },

    /// Show a model
    Get { model_id: String },

    /// Delete a model and all its versions
    #[command(visible_alias = "rm")]
    Delete { model_id: String },

    /// List versions of a model
    Versions {
        model_id: String,

        #[command(flatten)]
        list: ListArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum ImageCommands {
    /// List images
    #[command(visible_alias = "ls")]
    List {
        /// Workspace to list (defaults to the profile's workspace)
        #[arg(long)]
        workspace_id: Option<String>,

        /// Filter by image name
        #[arg(long)]
        name: Option<String>,

        /// Filter by label, as key=value
        #[arg(long)]
        label: Vec<String>,

        /// Only PAI official images
        #[arg(long)]
        official: bool,

        #[command(flatten)]
        list: ListArgs,
    },

    /// Show an image
    Get { image_id: String },
}

#[derive(Subcommand, Debug)]
pub enum PipelineCommands {
    /// List pipelines
    #[command(visible_alias = "ls")]
    List {
        /// Workspace to list (defaults to the profile's workspace)
        #[arg(long)]
        workspace_id: Option<String>,

        /// Filter by pipeline identifier
        #[arg(long)]
        identifier: Option<String>,

        /// Filter by provider
        #[arg(long)]
        provider: Option<String>,

        #[command(flatten)]
        list: ListArgs,
    },

    /// Show a pipeline
    Get {
        pipeline_id: String,

        /// Print only the manifest
        #[arg(long)]
        manifest: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum RunCommands {
    /// List pipeline runs
    #[command(visible_alias = "ls")]
    List {
        /// Workspace to list (defaults to the profile's workspace)
        #[arg(long)]
        workspace_id: Option<String>,

        /// Filter by run name
        #[arg(long)]
        name: Option<String>,

        /// Filter by status
        #[arg(long)]
        status: Option<String>,

        /// Only runs of this pipeline
        #[arg(long)]
        pipeline_id: Option<String>,

        #[command(flatten)]
        list: ListArgs,
    },

    /// Show a pipeline run
    Get { run_id: String },

    /// Create and start a pipeline run
    #[command(group(
        ArgGroup::new("source")
            .required(true)
            .args(["pipeline_id", "manifest"]),
    ))]
    Create {
        /// Run a registered pipeline
        #[arg(long)]
        pipeline_id: Option<String>,

        /// Run an inline manifest read from this file
        #[arg(long)]
        manifest: Option<String>,

        /// Run arguments file (YAML or JSON)
        #[arg(long)]
        arguments: Option<String>,

        /// Run name
        #[arg(long)]
        name: Option<String>,

        /// Workspace to run in (defaults to the profile's workspace)
        #[arg(long)]
        workspace_id: Option<String>,

        /// Wait for the run to finish
        #[arg(long)]
        wait: bool,

        #[command(flatten)]
        wait_args: WaitArgs,
    },

    /// Start a run that was created without starting
    Start { run_id: String },

    /// Terminate a running run
    Terminate { run_id: String },

    /// Delete a run
    #[command(visible_alias = "rm")]
    Delete { run_id: String },

    /// Wait until a run succeeds
    Wait {
        run_id: String,

        #[command(flatten)]
        wait_args: WaitArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum JobCommands {
    /// List training jobs
    #[command(visible_alias = "ls")]
    List {
        /// Workspace to list (defaults to the profile's workspace)
        #[arg(long)]
        workspace_id: Option<String>,

        /// Filter by display name
        #[arg(long)]
        name: Option<String>,

        /// Filter by status
        #[arg(long)]
        status: Option<String>,

        /// Filter by job type, e.g. PyTorchJob
        #[arg(long = "type")]
        job_type: Option<String>,

        #[command(flatten)]
        list: ListArgs,
    },

    /// Show a training job
    Get { job_id: String },

    /// Stop a running job
    Stop { job_id: String },

    /// Delete a job
    #[command(visible_alias = "rm")]
    Delete { job_id: String },

    /// Wait until a job succeeds
    Wait {
        job_id: String,

        #[command(flatten)]
        wait_args: WaitArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum ServiceCommands {
    /// List services
    #[command(visible_alias = "ls")]
    List {
        /// Fuzzy match on the service name
        #[arg(long)]
        filter: Option<String>,

        /// Workspace to list
        #[arg(long)]
        workspace_id: Option<String>,

        /// Only services in this group
        #[arg(long)]
        group: Option<String>,

        /// Only services on this resource group
        #[arg(long)]
        resource: Option<String>,

        /// Filter by status
        #[arg(long)]
        status: Option<String>,

        #[command(flatten)]
        list: ListArgs,
    },

    /// Show a service
    Get {
        name: String,

        /// Region the service runs in (defaults to the profile's region)
        #[arg(long)]
        cluster_id: Option<String>,
    },

    /// Create a service from a JSON or YAML service config
    #[command(after_help = "EXAMPLES:
    # service.json
    # {
    #   \"metadata\": {\"name\": \"iris_demo\", \"instance\": 1, \"cpu\": 1, \"memory\": 2000},
    #   \"processor\": \"pmml\",
    #   \"model_path\": \"oss://examplebucket/iris.pmml\"
    # }
    paictl service create --config service.json --wait
")]
    Create {
        /// Service config file
        #[arg(long)]
        config: String,

        /// Wait until the service is running
        #[arg(long)]
        wait: bool,

        #[command(flatten)]
        wait_args: WaitArgs,
    },

    /// Update a service's config or instance count
    #[command(group(
        ArgGroup::new("change")
            .required(true)
            .multiple(true)
            .args(["config", "instances"]),
    ))]
    Update {
        name: String,

        /// Full or partial service config file
        #[arg(long)]
        config: Option<String>,

        /// New instance count
        #[arg(long)]
        instances: Option<u32>,

        #[arg(long)]
        cluster_id: Option<String>,
    },

    /// Delete a service
    #[command(visible_alias = "rm")]
    Delete {
        name: String,

        #[arg(long)]
        cluster_id: Option<String>,
    },

    /// Start a stopped service
    Start {
        name: String,

        #[arg(long)]
        cluster_id: Option<String>,
    },

    /// Stop a running service
    Stop {
        name: String,

        #[arg(long)]
        cluster_id: Option<String>,
    },

    /// Wait until a service reaches a status
    Wait {
        name: String,

        /// Status to wait for
        #[arg(long, default_value = "Running")]
        status: String,

        #[arg(long)]
        cluster_id: Option<String>,

        #[command(flatten)]
        wait_args: WaitArgs,
    },

    /// Print a service's config document
    Config {
        name: String,

        #[arg(long)]
        cluster_id: Option<String>,
    },
}
