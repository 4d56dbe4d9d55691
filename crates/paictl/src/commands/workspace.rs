use futures::TryStreamExt;
use pai_core::api::workspace::{MemberFilter, WorkspaceFilter};
use pai_core::entity::Workspace;
use pai_core::paginate;

use crate::cli::WorkspaceCommands;
use crate::connection::ConnectionManager;
use crate::error::Result;
use crate::output::{self, OutputFormat};

const COLUMNS: &[&str] = &["WorkspaceId", "WorkspaceName", "Status", "EnvTypes", "Creator"];
const MEMBER_COLUMNS: &[&str] = &["MemberId", "UserId", "DisplayName", "Roles"];

pub async fn handle_workspace_command(
    cmd: &WorkspaceCommands,
    conn_mgr: &ConnectionManager,
    profile: Option<&str>,
    output_format: OutputFormat,
) -> Result<()> {
    let session = conn_mgr.session(profile)?;

    match cmd {
        WorkspaceCommands::List { name, list } => {
            let api = session.workspaces();
            let filter = WorkspaceFilter {
                workspace_name: name.clone(),
                ..WorkspaceFilter::default()
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
        WorkspaceCommands::Get { workspace_id } => {
            let workspace = match workspace_id {
                Some(id) => Workspace::get(&session, id).await?,
                None => Workspace::current(&session).await?,
            };
            output::print_output(workspace.record(), output_format)
        }
        WorkspaceCommands::Members {
            workspace_id,
            role,
            list,
        } => {
            let workspace = match workspace_id {
                Some(id) => Workspace::get(&session, id).await?,
                None => Workspace::current(&session).await?,
            };
            let filter = MemberFilter {
                roles: role.clone(),
                ..MemberFilter::default()
            };
            let options = list.options();
            if list.all {
                let items: Vec<_> = paginate(
                    |page, size| {
                        let options = options.at_page(page, size);
                        let (workspace, filter) = (&workspace, &filter);
                        async move { workspace.members(filter, &options).await }
                    },
                    options.page_number,
                    options.page_size,
                )
                .try_collect()
                .await?;
                output::print_list(&items, output_format, MEMBER_COLUMNS)
            } else {
                let page = workspace.members(&filter, &options).await?;
                output::print_page(&page, output_format, MEMBER_COLUMNS)
            }
        }
    }
}
