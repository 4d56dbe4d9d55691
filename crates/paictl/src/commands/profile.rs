//! Profile management command implementations

use colored::Colorize;
use pai_core::{CredentialStore, Product, Profile};
use serde_json::json;
use tracing::{debug, info};

use crate::cli::ProfileCommands;
use crate::connection::ConnectionManager;
use crate::error::{PaictlError, Result};
use crate::output::{self, OutputFormat};

/// Handle profile management commands
pub async fn handle_profile_command(
    profile_cmd: &ProfileCommands,
    conn_mgr: &mut ConnectionManager,
    output_format: OutputFormat,
) -> Result<()> {
    use ProfileCommands::*;

    match profile_cmd {
        List => handle_list(conn_mgr, output_format),
        Path => handle_path(conn_mgr, output_format),
        Show { name } => handle_show(conn_mgr, name, output_format),
        Set {
            name,
            access_key_id,
            access_key_secret,
            security_token,
            region_id,
            workspace_id,
            endpoints,
            timeout_secs,
            default,
            #[cfg(feature = "secure-storage")]
            use_keyring,
        } => {
            #[cfg(feature = "secure-storage")]
            let (access_key_secret, security_token) = if *use_keyring {
                let store = CredentialStore::new();
                let secret = store_secret(&store, name, "access-key-secret", access_key_secret)?;
                let token = security_token
                    .as_deref()
                    .map(|t| store_secret(&store, name, "security-token", t))
                    .transpose()?;
                println!("Credentials stored in {}", store.storage_backend());
                (secret, token)
            } else {
                (access_key_secret.clone(), security_token.clone())
            };
            #[cfg(not(feature = "secure-storage"))]
            let (access_key_secret, security_token) =
                (access_key_secret.clone(), security_token.clone());

            let mut profile = Profile::new(access_key_id, &access_key_secret);
            profile.security_token = security_token;
            profile.region_id = region_id.clone();
            profile.workspace_id = workspace_id.clone();
            profile.timeout_secs = *timeout_secs;
            for (product, url) in endpoints {
                profile.endpoints.set(*product, url);
            }
            handle_set(conn_mgr, name, profile, *default)
        }
        Remove { name } => handle_remove(conn_mgr, name),
        Default { name } => handle_default(conn_mgr, name),
    }
}

fn handle_list(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> Result<()> {
    let profiles = conn_mgr.config.list_profiles();
    debug!("Found {} profiles", profiles.len());

    if profiles.is_empty() && output_format.is_table() {
        println!("No profiles configured.");
        println!("Use 'paictl profile set' to create a profile.");
        return Ok(());
    }

    let rows: Vec<_> = profiles
        .iter()
        .map(|(name, profile)| {
            json!({
                "Name": name,
                "Default": conn_mgr.config.default_profile.as_deref() == Some(name.as_str()),
                "RegionId": profile.region_id,
                "WorkspaceId": profile.workspace_id,
            })
        })
        .collect();
    output::print_list(&rows, output_format, &["Name", "Default", "RegionId", "WorkspaceId"])
}

fn handle_path(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> Result<()> {
    let path = conn_mgr.config_file()?;
    match output_format {
        OutputFormat::Table => println!("{}", path.display()),
        _ => output::print_output(json!({ "path": path.display().to_string() }), output_format)?,
    }
    Ok(())
}

fn handle_show(conn_mgr: &ConnectionManager, name: &str, output_format: OutputFormat) -> Result<()> {
    let profile = conn_mgr
        .config
        .profiles
        .get(name)
        .ok_or_else(|| PaictlError::ProfileNotFound {
            name: name.to_string(),
        })?;

    let endpoints: serde_json::Map<String, serde_json::Value> = Product::ALL
        .iter()
        .filter_map(|product| {
            profile
                .endpoints
                .get(*product)
                .map(|url| (product.to_string(), json!(url)))
        })
        .collect();

    let view = json!({
        "Name": name,
        "AccessKeyId": mask(&profile.access_key_id),
        "AccessKeySecret": mask(&profile.access_key_secret),
        "SecurityToken": profile.security_token.as_deref().map(mask),
        "RegionId": profile.region_id,
        "WorkspaceId": profile.workspace_id,
        "Endpoints": endpoints,
        "TimeoutSecs": profile.timeout_secs,
        "Default": conn_mgr.config.default_profile.as_deref() == Some(name),
    });
    output::print_output(view, output_format)
}

fn handle_set(
    conn_mgr: &mut ConnectionManager,
    name: &str,
    profile: Profile,
    make_default: bool,
) -> Result<()> {
    let first = conn_mgr.config.profiles.is_empty();
    conn_mgr.config.set_profile(name.to_string(), profile);
    if make_default || first {
        conn_mgr.config.default_profile = Some(name.to_string());
    }
    conn_mgr.save_config()?;
    info!("Saved profile '{}'", name);

    println!("{} Profile '{}' saved", "✓".green(), name);
    if make_default || first {
        println!("  '{}' is the default profile", name);
    }
    Ok(())
}

fn handle_remove(conn_mgr: &mut ConnectionManager, name: &str) -> Result<()> {
    let Some(removed) = conn_mgr.config.remove_profile(name) else {
        return Err(PaictlError::ProfileNotFound {
            name: name.to_string(),
        });
    };
    conn_mgr.save_config()?;

    // Keyring entries still referenced by another profile are kept
    let store = CredentialStore::new();
    for key in keyring_keys(&removed) {
        let shared = conn_mgr
            .config
            .profiles
            .values()
            .any(|other| keyring_keys(other).contains(&key));
        if !shared {
            debug!("Deleting keyring entry '{}'", key);
            store.delete_credential(key)?;
        }
    }

    println!("{} Profile '{}' removed", "✓".green(), name);
    Ok(())
}

/// Keyring entry names a profile's credentials point at
fn keyring_keys(profile: &Profile) -> Vec<&str> {
    [
        Some(profile.access_key_id.as_str()),
        Some(profile.access_key_secret.as_str()),
        profile.security_token.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|value| CredentialStore::is_keyring_reference(value))
    .filter_map(|value| value.strip_prefix("keyring:"))
    .collect()
}

/// Move one credential into the store; values that are already references are kept as written
#[cfg(feature = "secure-storage")]
fn store_secret(store: &CredentialStore, profile: &str, field: &str, value: &str) -> Result<String> {
    if CredentialStore::is_keyring_reference(value) || value.starts_with("${") {
        return Ok(value.to_string());
    }
    Ok(store.store_credential(&format!("{}-{}", profile, field), value)?)
}

fn handle_default(conn_mgr: &mut ConnectionManager, name: &str) -> Result<()> {
    if !conn_mgr.config.profiles.contains_key(name) {
        return Err(PaictlError::ProfileNotFound {
            name: name.to_string(),
        });
    }
    conn_mgr.config.default_profile = Some(name.to_string());
    conn_mgr.save_config()?;
    println!("{} Default profile set to '{}'", "✓".green(), name);
    Ok(())
}

/// Hide all but the first four characters; references are shown as written
fn mask(value: &str) -> String {
    if value.starts_with("keyring:") || value.starts_with("${") {
        return value.to_string();
    }
    let visible: String = value.chars().take(4).collect();
    if value.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}
