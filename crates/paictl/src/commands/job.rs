use futures::TryStreamExt;
use pai_core::api::training_job::JobFilter;

use crate::cli::JobCommands;
use crate::commands::{print_done, progress_printer};
use crate::connection::{ConnectionManager, workspace_or_default};
use crate::error::Result;
use crate::output::{self, OutputFormat};

const COLUMNS: &[&str] = &["JobId", "DisplayName", "JobType", "Status", "GmtCreateTime"];

pub async fn handle_job_command(
    cmd: &JobCommands,
    conn_mgr: &ConnectionManager,
    profile: Option<&str>,
    output_format: OutputFormat,
) -> Result<()> {
    let session = conn_mgr.session(profile)?;
    let api = session.training_jobs();

    match cmd {
        JobCommands::List {
            workspace_id,
            name,
            status,
            job_type,
            list,
        } => {
            let filter = JobFilter {
                workspace_id: workspace_or_default(&session, workspace_id.as_ref()),
                display_name: name.clone(),
                status: status.clone(),
                job_type: job_type.clone(),
                ..JobFilter::default()
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
        JobCommands::Get { job_id } => {
            let job = api.get(job_id).await?;
            output::print_output(&job, output_format)
        }
        JobCommands::Stop { job_id } => {
            api.stop(job_id).await?;
            print_done(output_format, &format!("Job {} stopping", job_id));
            Ok(())
        }
        JobCommands::Delete { job_id } => {
            api.delete(job_id).await?;
            print_done(output_format, &format!("Job {} deleted", job_id));
            Ok(())
        }
        JobCommands::Wait { job_id, wait_args } => {
            let status = api
                .wait(
                    job_id,
                    wait_args.timeout(),
                    wait_args.interval(),
                    Some(progress_printer()),
                )
                .await?;
            print_done(output_format, &format!("Job {} {}", job_id, status));
            Ok(())
        }
    }
}
