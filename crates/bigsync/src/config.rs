//! Flag and profile resolution: turns global options plus the config
//! file into a connected [`ServiceManager`].
//!
//! Precedence is flag > profile > defaults. A config file is optional;
//! `--host` with `BIGSYNC_USERNAME`/`BIGSYNC_PASSWORD` set is enough.

use std::sync::Arc;

use tracing::debug;

use bigsync_api::DeviceClient;
use bigsync_config::{Config, Profile};
use bigsync_core::{DeviceProxy, RestDeviceProxy, ServiceManager};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// A resolved device connection plus the defaults commands fall back to.
pub struct Session {
    pub manager: ServiceManager,
    /// Watch-mode interval when `--interval` is not given, in seconds.
    pub interval_default: u64,
}

/// Resolve the active profile, apply flag overrides, and connect.
pub fn connect(global: &GlobalOpts) -> Result<Session, CliError> {
    let config = bigsync_config::load_config()?;
    let (name, mut profile) = active_profile(&config, global)?;

    if let Some(host) = &global.host {
        profile.host.clone_from(host);
    }
    if global.insecure || (profile.insecure.is_none() && config.defaults.insecure) {
        profile.insecure = Some(global.insecure || config.defaults.insecure);
    }
    profile.timeout = global
        .timeout
        .or(profile.timeout)
        .or(Some(config.defaults.timeout));

    let partition = global
        .partition
        .clone()
        .unwrap_or_else(|| profile.partition.clone());
    let jobs = global.jobs.or(profile.jobs).unwrap_or(config.defaults.jobs);

    let connection = bigsync_config::profile_to_connection(&profile, &name)?;
    debug!(
        profile = name,
        host = connection.url,
        partition,
        jobs,
        "connecting to device"
    );

    let client = DeviceClient::new(connection)?;
    let proxy: Arc<dyn DeviceProxy> = Arc::new(RestDeviceProxy::new(Arc::new(client)));
    Ok(Session {
        manager: ServiceManager::new(proxy, partition).with_jobs(jobs),
        interval_default: config.defaults.interval,
    })
}

/// Pick the profile the command runs against.
///
/// A named or default profile from the config file wins; without one,
/// `--host` alone builds an ad-hoc profile so the CLI works before
/// `config init` has ever run.
fn active_profile(config: &Config, global: &GlobalOpts) -> Result<(String, Profile), CliError> {
    match config.profile(global.profile.as_deref()) {
        Ok((name, profile)) => Ok((name.to_owned(), profile.clone())),
        Err(_) if global.profile.is_none() && global.host.is_some() => {
            Ok(("default".to_owned(), Profile::new(String::new())))
        }
        Err(err) => Err(err.into()),
    }
}
