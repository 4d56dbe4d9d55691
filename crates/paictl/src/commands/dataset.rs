use futures::TryStreamExt;
use pai_core::api::dataset::DatasetFilter;
use tracing::debug;

use crate::cli::DatasetCommands;
use crate::commands::print_done;
use crate::connection::{ConnectionManager, workspace_or_default};
use crate::error::Result;
use crate::output::{self, OutputFormat};

const COLUMNS: &[&str] = &["DatasetId", "Name", "DataSourceType", "Property", "Uri"];

pub async fn handle_dataset_command(
    cmd: &DatasetCommands,
    conn_mgr: &ConnectionManager,
    profile: Option<&str>,
    output_format: OutputFormat,
) -> Result<()> {
    let session = conn_mgr.session(profile)?;
    let api = session.datasets();

    match cmd {
        DatasetCommands::List {
            workspace_id,
            name,
            source_type,
            list,
        } => {
            let filter = DatasetFilter {
                workspace_id: workspace_or_default(&session, workspace_id.as_ref()),
                name: name.clone(),
                data_source_types: source_type.clone(),
                ..DatasetFilter::default()
            };
            debug!("Listing datasets with {:?}", filter);
            let options = list.options();
            if list.all {
                let items: Vec<_> = api.list_all(&filter, &options).try_collect().await?;
                output::print_list(&items, output_format, COLUMNS)
            } else {
                let page = api.list(&filter, &options).await?;
                output::print_page(&page, output_format, COLUMNS)
            }
        }
        DatasetCommands::Get { dataset_id } => {
            let dataset = api.get(dataset_id).await?;
            output::print_output(&dataset, output_format)
        }
        DatasetCommands::Delete { dataset_id } => {
            api.delete(dataset_id).await?;
            print_done(output_format, &format!("Dataset {} deleted", dataset_id));
            Ok(())
        }
    }
}
