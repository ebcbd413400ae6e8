//! Hubble CLI commands: whoami, kubeconfig, ping.
//!
//! `hubble whoami`     : resolve the token and print the user
//! `hubble kubeconfig` : resolve the token and write the cluster kubeconfig
//! `hubble ping`       : check that the endpoint answers

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine as _;
use hubble_client::{
    Client, HubbleError, IdentityParams, IdentityResolver, Session, SessionStore,
    delete_file, file_exists, is_url_reachable,
};
use hubble_config::Config;
use log::debug;

use crate::exit_codes::*;
use crate::{CliError, IdentityArgs};

// ── Shared ──────────────────────────────────────────────────────────

fn hubble_error(err: HubbleError) -> CliError {
    let code = hubble_exit_code(&err);
    let hint = match &err {
        HubbleError::Validation(_) => {
            Some("pass --token, --user-uid, --project-uid, --cluster-uid and --endpoint".to_string())
        }
        HubbleError::CertificateLoad { .. } => {
            Some("check [hubble.tls] certificate and certificate_key in the config file".to_string())
        }
        HubbleError::Status { status: 401, .. } | HubbleError::Status { status: 403, .. } => {
            Some("the token may have expired; request a new one".to_string())
        }
        _ => None,
    };
    CliError { code, message: err.to_string(), hint }
}

/// Endpoint flag wins over config file and `HUBBLE_ENDPOINT`.
fn identity_params(args: IdentityArgs, config: &Config) -> IdentityParams {
    IdentityParams {
        token: args.token.unwrap_or_default(),
        user_uid: args.user_uid.unwrap_or_default(),
        project_uid: args.project_uid.unwrap_or_default(),
        cluster_uid: args.cluster_uid.unwrap_or_default(),
        endpoint: args.endpoint.unwrap_or_else(|| config.endpoint().to_string()),
    }
}

fn resolve(args: IdentityArgs, config: &Config) -> Result<Session, CliError> {
    let params = identity_params(args, config);
    debug!("resolving identity against {}", params.endpoint);
    let resolver = IdentityResolver::new(config, Arc::new(SessionStore::new()));
    resolver.resolve(&params).map_err(hubble_error)
}

// ── whoami ──────────────────────────────────────────────────────────

pub fn cmd_whoami(args: IdentityArgs, config: &Config, json: bool) -> Result<(), CliError> {
    let session = resolve(args, config)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_whoami(&mut out, &session, json)
}

fn write_whoami(out: &mut impl Write, session: &Session, json: bool) -> Result<(), CliError> {
    if json {
        let text = serde_json::to_string_pretty(session)
            .map_err(|e| CliError::io(e.to_string()))?;
        return writeln!(out, "{}", text).map_err(|e| CliError::io(e.to_string()));
    }

    let spec = session.user.spec.clone().unwrap_or_default();
    let full_name = format!("{} {}", spec.first_name, spec.last_name);
    let lines = [
        ("User", full_name.trim().to_string()),
        ("Email", spec.email_id),
        ("Roles", spec.roles.join(", ")),
        ("Session", session.name.clone()),
        ("Cluster", session.cluster_uid.clone()),
    ];
    for (label, value) in lines {
        writeln!(out, "{:<8} {}", format!("{}:", label), value)
            .map_err(|e| CliError::io(e.to_string()))?;
    }
    Ok(())
}

// ── kubeconfig ──────────────────────────────────────────────────────

pub fn cmd_kubeconfig(
    args: IdentityArgs,
    config: &Config,
    output: Option<PathBuf>,
    force: bool,
) -> Result<(), CliError> {
    let session = resolve(args, config)?;
    let kubeconfig = base64::engine::general_purpose::STANDARD
        .decode(&session.kube_config)
        .map_err(|e| CliError { code: EXIT_ERROR, message: e.to_string(), hint: None })?;

    match output {
        Some(path) => {
            write_kubeconfig(&path, &kubeconfig, force)?;
            eprintln!("Wrote kubeconfig for cluster {} to {}", session.cluster_uid, path.display());
            Ok(())
        }
        None => io::stdout()
            .write_all(&kubeconfig)
            .map_err(|e| CliError::io(e.to_string())),
    }
}

/// Write with 0600 permissions on Unix. An existing file is replaced only
/// with `force`.
fn write_kubeconfig(path: &Path, contents: &[u8], force: bool) -> Result<(), CliError> {
    if file_exists(path).map_err(|e| CliError::io(e.to_string()))? {
        if !force {
            return Err(CliError {
                code: EXIT_USAGE,
                message: format!("{} already exists", path.display()),
                hint: Some("pass --force to overwrite".into()),
            });
        }
        delete_file(path).map_err(|e| CliError::io(e.to_string()))?;
    }

    std::fs::write(path, contents)
        .map_err(|e| CliError::io(format!("Failed to write {}: {}", path.display(), e)))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .map_err(|e| CliError::io(format!("Failed to set file permissions: {}", e)))?;
    }

    Ok(())
}

// ── ping ────────────────────────────────────────────────────────────

pub fn cmd_ping(endpoint: Option<String>, config: &Config) -> Result<(), CliError> {
    let endpoint = endpoint.unwrap_or_else(|| config.endpoint().to_string());
    let client = Client::new(&endpoint).map_err(hubble_error)?;
    let url = client.base_url().as_str();
    debug!("pinging {}", url);

    if is_url_reachable(url) {
        println!("{} is reachable", url);
        Ok(())
    } else {
        Err(CliError {
            code: EXIT_NETWORK,
            message: format!("{} is not reachable", url),
            hint: None,
        })
    }
}
