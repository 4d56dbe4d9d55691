use futures::TryStreamExt;
use pai_core::api::image::{ImageFilter, OFFICIAL_LABEL};

use crate::cli::ImageCommands;
use crate::connection::{ConnectionManager, workspace_or_default};
use crate::error::{PaictlError, Result};
use crate::output::{self, OutputFormat};

const COLUMNS: &[&str] = &["ImageId", "Name", "ImageUri", "Accessibility"];

pub async fn handle_image_command(
    cmd: &ImageCommands,
    conn_mgr: &ConnectionManager,
    profile: Option<&str>,
    output_format: OutputFormat,
) -> Result<()> {
    let session = conn_mgr.session(profile)?;
    let api = session.images();

    match cmd {
        ImageCommands::List {
            workspace_id,
            name,
            label,
            official,
            list,
        } => {
            let mut labels = label
                .iter()
                .map(|l| label_filter(l))
                .collect::<Result<Vec<_>>>()?;
            if *official {
                labels.push(format!("{}=true", OFFICIAL_LABEL));
            }
            let filter = ImageFilter {
                workspace_id: workspace_or_default(&session, workspace_id.as_ref()),
                name: name.clone(),
                labels,
                ..ImageFilter::default()
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
        ImageCommands::Get { image_id } => {
            let image = api.get(image_id).await?;
            output::print_output(&image, output_format)
        }
    }
}

/// Labels are filtered as `key=value`
fn label_filter(raw: &str) -> Result<String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() && !value.is_empty() => Ok(raw.to_string()),
        _ => Err(PaictlError::InvalidInput {
            message: format!("label filter must be key=value, got '{}'", raw),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_filter() {
        assert_eq!(label_filter("system.chipType=GPU").unwrap(), "system.chipType=GPU");
        assert!(label_filter("system.chipType").is_err());
        assert!(label_filter("=GPU").is_err());
    }
}
