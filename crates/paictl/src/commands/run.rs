use futures::TryStreamExt;
use pai_core::api::pipeline_run::{CreatePipelineRunRequest, PipelineRunFilter};
use serde_json::json;
use tracing::info;

use crate::cli::RunCommands;
use crate::commands::{print_done, progress_printer, read_input_file};
use crate::connection::{ConnectionManager, workspace_or_default};
use crate::error::{PaictlError, Result};
use crate::output::{self, OutputFormat};

const COLUMNS: &[&str] = &[
    "PipelineRunId",
    "Name",
    "Status",
    "PipelineId",
    "GmtCreateTime",
];

pub async fn handle_run_command(
    cmd: &RunCommands,
    conn_mgr: &ConnectionManager,
    profile: Option<&str>,
    output_format: OutputFormat,
) -> Result<()> {
    let session = conn_mgr.session(profile)?;
    let api = session.pipeline_runs();

    match cmd {
        RunCommands::List {
            workspace_id,
            name,
            status,
            pipeline_id,
            list,
        } => {
            let filter = PipelineRunFilter {
                workspace_id: workspace_or_default(&session, workspace_id.as_ref()),
                name: name.clone(),
                status: status.clone(),
                pipeline_id: pipeline_id.clone(),
                ..PipelineRunFilter::default()
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
        RunCommands::Get { run_id } => {
            let run = api.get(run_id).await?;
            output::print_output(&run, output_format)
        }
        RunCommands::Create {
            pipeline_id,
            manifest,
            arguments,
            name,
            workspace_id,
            wait,
            wait_args,
        } => {
            let mut request = match (pipeline_id, manifest) {
                (Some(id), None) => CreatePipelineRunRequest::from_pipeline(id),
                (None, Some(path)) => CreatePipelineRunRequest::from_manifest(read_input_file(path)?),
                _ => {
                    return Err(PaictlError::InvalidInput {
                        message: "pass exactly one of --pipeline-id or --manifest".to_string(),
                    });
                }
            };
            if let Some(workspace_id) = workspace_or_default(&session, workspace_id.as_ref()) {
                request = request.with_workspace_id(workspace_id);
            }
            if let Some(name) = name {
                request = request.with_name(name);
            }
            if let Some(path) = arguments {
                request = request.with_arguments(read_input_file(path)?);
            }

            let run_id = api.create(&request).await?;
            info!("Created pipeline run {}", run_id);

            let status = if *wait {
                Some(
                    api.wait(
                        &run_id,
                        wait_args.timeout(),
                        wait_args.interval(),
                        Some(progress_printer()),
                    )
                    .await?,
                )
            } else {
                None
            };

            if output_format.is_table() {
                println!("{}", run_id);
                Ok(())
            } else {
                output::print_output(
                    &json!({ "PipelineRunId": run_id, "Status": status }),
                    output_format,
                )
            }
        }
        RunCommands::Start { run_id } => {
            api.start(run_id).await?;
            print_done(output_format, &format!("Run {} started", run_id));
            Ok(())
        }
        RunCommands::Terminate { run_id } => {
            api.terminate(run_id).await?;
            print_done(output_format, &format!("Run {} terminated", run_id));
            Ok(())
        }
        RunCommands::Delete { run_id } => {
            api.delete(run_id).await?;
            print_done(output_format, &format!("Run {} deleted", run_id));
            Ok(())
        }
        RunCommands::Wait { run_id, wait_args } => {
            let status = api
                .wait(
                    run_id,
                    wait_args.timeout(),
                    wait_args.interval(),
                    Some(progress_printer()),
                )
                .await?;
            print_done(output_format, &format!("Run {} {}", run_id, status));
            Ok(())
        }
    }
}
