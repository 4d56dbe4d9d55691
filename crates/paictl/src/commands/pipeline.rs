use futures::TryStreamExt;
use pai_core::api::pipeline::PipelineFilter;

use crate::cli::PipelineCommands;
use crate::connection::{ConnectionManager, workspace_or_default};
use crate::error::Result;
use crate::output::{self, OutputFormat};

const COLUMNS: &[&str] = &["PipelineId", "Identifier", "Provider", "Version"];

pub async fn handle_pipeline_command(
    cmd: &PipelineCommands,
    conn_mgr: &ConnectionManager,
    profile: Option<&str>,
    output_format: OutputFormat,
) -> Result<()> {
    let session = conn_mgr.session(profile)?;
    let api = session.pipelines();

    match cmd {
        PipelineCommands::List {
            workspace_id,
            identifier,
            provider,
            list,
        } => {
            let filter = PipelineFilter {
                workspace_id: workspace_or_default(&session, workspace_id.as_ref()),
                pipeline_identifier: identifier.clone(),
                pipeline_provider: provider.clone(),
                ..PipelineFilter::default()
            };
            let options = list.options();
            if list.all {
                let items: Vec<_> = api.list_all(&filter, &options).try_collect().await?;
                output::print_list(&items, output_format, COLUMNS)
            } else {
                let page = api.list(&filter, &options).await?;
                output::print_page(&page, output_format, COLUMNS)
            }
        }
        PipelineCommands::Get {
            pipeline_id,
            manifest,
        } => {
            let pipeline = api.get(pipeline_id).await?;
            if *manifest {
                println!("{}", pipeline.manifest.as_deref().unwrap_or_default());
                Ok(())
            } else {
                output::print_output(&pipeline, output_format)
            }
        }
    }
}
