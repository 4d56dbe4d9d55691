use futures::TryStreamExt;
use pai_core::api::model::{ModelFilter, ModelVersionFilter};
use pai_core::entity::Model;
use pai_core::paginate;

use crate::cli::ModelCommands;
use crate::commands::print_done;
use crate::connection::{ConnectionManager, workspace_or_default};
use crate::error::Result;
use crate::output::{self, OutputFormat};

const COLUMNS: &[&str] = &["ModelId", "ModelName", "Domain", "Task", "GmtCreateTime"];
const VERSION_COLUMNS: &[&str] = &[
    "VersionName",
    "Uri",
    "FrameworkType",
    "ApprovalStatus",
    "GmtCreateTime",
];

pub async fn handle_model_command(
    cmd: &ModelCommands,
    conn_mgr: &ConnectionManager,
    profile: Option<&str>,
    output_format: OutputFormat,
) -> Result<()> {
    let session = conn_mgr.session(profile)?;
    let api = session.models();

    match cmd {
        ModelCommands::List {
            workspace_id,
            name,
            domain,
            task,
            list,
        } => {
            let filter = ModelFilter {
                workspace_id: workspace_or_default(&session, workspace_id.as_ref()),
                model_name: name.clone(),
                domain: domain.clone(),
                task: task.clone(),
                ..ModelFilter::default()
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
        ModelCommands::Get { model_id } => {
            let model = api.get(model_id).await?;
            output::print_output(&model, output_format)
        }
        ModelCommands::Delete { model_id } => {
            Model::get(&session, model_id).await?.delete().await?;
            print_done(output_format, &format!("Model {} deleted", model_id));
            Ok(())
        }
        ModelCommands::Versions { model_id, list } => {
            let filter = ModelVersionFilter::default();
            let options = list.options();
            if list.all {
                let items: Vec<_> = paginate(
                    |page, size| {
                        let options = options.at_page(page, size);
                        let (api, filter) = (&api, &filter);
                        async move { api.list_versions(model_id, filter, &options).await }
                    },
                    options.page_number,
                    options.page_size,
                )
                .try_collect()
                .await?;
                output::print_list(&items, output_format, VERSION_COLUMNS)
            } else {
                let page = api.list_versions(model_id, &filter, &options).await?;
                output::print_page(&page, output_format, VERSION_COLUMNS)
            }
        }
    }
}
