use futures::TryStreamExt;
use pai_core::api::service::ServiceFilter;
use pai_core::entity::{DEPLOY_UNEXPECTED, Service};
use pai_core::{ServiceConfig, ServiceStatus, Session};

use crate::cli::ServiceCommands;
use crate::commands::{is_yaml_path, print_done, progress_printer, read_input_file};
use crate::connection::ConnectionManager;
use crate::error::{PaictlError, Result};
use crate::output::{self, OutputFormat};

const COLUMNS: &[&str] = &[
    "ServiceName",
    "Status",
    "RunningInstance",
    "TotalInstance",
    "Region",
];

pub async fn handle_service_command(
    cmd: &ServiceCommands,
    conn_mgr: &ConnectionManager,
    profile: Option<&str>,
    output_format: OutputFormat,
) -> Result<()> {
    let session = conn_mgr.session(profile)?;

    match cmd {
        ServiceCommands::List {
            filter,
            workspace_id,
            group,
            resource,
            status,
            list,
        } => {
            let api = session.services();
            let filter = ServiceFilter {
                filter: filter.clone(),
                workspace_id: workspace_id.clone(),
                group_name: group.clone(),
                resource_name: resource.clone(),
                status: status.clone(),
                ..ServiceFilter::default()
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
        ServiceCommands::Get { name, cluster_id } => {
            let service = fetch(&session, name, cluster_id.as_deref()).await?;
            output::print_output(service.record(), output_format)
        }
        ServiceCommands::Create {
            config,
            wait,
            wait_args,
        } => {
            let config = load_config(config)?;
            let service = if *wait {
                Service::deploy(
                    &session,
                    &config,
                    wait_args.timeout(),
                    wait_args.interval(),
                    Some(progress_printer()),
                )
                .await?
            } else {
                Service::create(&session, &config).await?
            };
            output::print_output(service.record(), output_format)
        }
        ServiceCommands::Update {
            name,
            config,
            instances,
            cluster_id,
        } => {
            let service = fetch(&session, name, cluster_id.as_deref()).await?;
            if let Some(path) = config {
                service.update(&load_config(path)?).await?;
            }
            if let Some(instances) = instances {
                service.scale(*instances).await?;
            }
            print_done(output_format, &format!("Service {} updated", name));
            Ok(())
        }
        ServiceCommands::Delete { name, cluster_id } => {
            fetch(&session, name, cluster_id.as_deref())
                .await?
                .delete()
                .await?;
            print_done(output_format, &format!("Service {} deleted", name));
            Ok(())
        }
        ServiceCommands::Start { name, cluster_id } => {
            fetch(&session, name, cluster_id.as_deref())
                .await?
                .start()
                .await?;
            print_done(output_format, &format!("Service {} starting", name));
            Ok(())
        }
        ServiceCommands::Stop { name, cluster_id } => {
            fetch(&session, name, cluster_id.as_deref())
                .await?
                .stop()
                .await?;
            print_done(output_format, &format!("Service {} stopping", name));
            Ok(())
        }
        ServiceCommands::Wait {
            name,
            status,
            cluster_id,
            wait_args,
        } => {
            let mut service = fetch(&session, name, cluster_id.as_deref()).await?;
            let target = ServiceStatus::from(status.as_str());
            let unexpected = unexpected_for(&target);
            service
                .wait_for_status(
                    target,
                    &unexpected,
                    wait_args.timeout(),
                    wait_args.interval(),
                    Some(progress_printer()),
                )
                .await?;
            output::print_output(service.record(), output_format)
        }
        ServiceCommands::Config { name, cluster_id } => {
            let service = fetch(&session, name, cluster_id.as_deref()).await?;
            match service.config()? {
                Some(config) => output::print_output(&config.to_value()?, output_format),
                None => Err(PaictlError::NotFound {
                    message: format!("Service {} has no config document", name),
                }),
            }
        }
    }
}

/// Services are addressed by region; the profile's region is the default
async fn fetch(session: &Session, name: &str, cluster_id: Option<&str>) -> Result<Service> {
    let cluster_id = cluster_id.unwrap_or_else(|| session.region_id());
    let record = session.services().get(cluster_id, name).await?;
    Ok(Service::from_record(session.clone(), record))
}

fn load_config(path: &str) -> Result<ServiceConfig> {
    let raw = read_input_file(path)?;
    let config = if is_yaml_path(path) {
        ServiceConfig::from_yaml_str(&raw)
    } else {
        ServiceConfig::from_json_str(&raw)
    };
    config.map_err(|e| PaictlError::FileError {
        path: path.to_string(),
        message: e.to_string(),
    })
}

/// Waiting for Running fails fast on a failed deploy; other targets only on Failed
fn unexpected_for(target: &ServiceStatus) -> Vec<ServiceStatus> {
    if *target == ServiceStatus::Running {
        DEPLOY_UNEXPECTED.to_vec()
    } else {
        vec![ServiceStatus::Failed]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_unexpected_for_running_includes_delete_failed() {
        let unexpected = unexpected_for(&ServiceStatus::Running);
        assert!(unexpected.contains(&ServiceStatus::Failed));
        assert!(unexpected.contains(&ServiceStatus::DeleteFailed));
        assert_eq!(unexpected_for(&ServiceStatus::Stopped), vec![ServiceStatus::Failed]);
    }

    #[test]
    fn test_load_config_by_extension() {
        let mut yaml = Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(yaml, "metadata:\n  name: demo\n  instance: 2").unwrap();
        let config = load_config(yaml.path().to_str().unwrap()).unwrap();
        assert_eq!(config.name(), Some("demo"));

        let mut json = Builder::new().suffix(".json").tempfile().unwrap();
        write!(json, r#"{{"metadata": {{"name": "demo-json"}}}}"#).unwrap();
        let config = load_config(json.path().to_str().unwrap()).unwrap();
        assert_eq!(config.name(), Some("demo-json"));
    }

    #[test]
    fn test_load_config_reports_path() {
        let mut bad = Builder::new().suffix(".json").tempfile().unwrap();
        write!(bad, "not json").unwrap();
        let path = bad.path().to_str().unwrap().to_string();
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, PaictlError::FileError { path: p, .. } if p == path));
    }
}
