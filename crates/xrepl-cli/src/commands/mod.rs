pub mod add;
pub mod tables;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Args;
use tokio::sync::mpsc;
use tracing::debug;

use xrepl_client::HttpClient;
use xrepl_core::XreplConfig;
use xrepl_editor::{ChannelReporter, EditorSession, GroupCache, Notification};

/// Where the configuration comes from, plus command-line overrides.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Path to xrepl.toml.
    #[arg(short, long, global = true, default_value = "xrepl.toml")]
    pub config: PathBuf,
    /// Override [api].base_url.
    #[arg(long, global = true)]
    pub base_url: Option<String>,
    /// Override [api].customer_id.
    #[arg(long, global = true)]
    pub customer: Option<String>,
    /// Override [api].api_token.
    #[arg(long, global = true)]
    pub token: Option<String>,
}

impl ConfigArgs {
    /// Read the config file and apply overrides.
    ///
    /// A missing file is fine as long as both the base URL and customer
    /// are given on the command line.
    pub fn load(&self) -> anyhow::Result<XreplConfig> {
        let mut config = if self.config.exists() {
            XreplConfig::from_file(&self.config)
                .with_context(|| format!("loading {}", self.config.display()))?
        } else {
            match (&self.base_url, &self.customer) {
                (Some(base_url), Some(customer)) => XreplConfig::new(base_url, customer),
                _ => bail!(
                    "{} not found; pass --base-url and --customer or create it",
                    self.config.display()
                ),
            }
        };

        if let Some(base_url) = &self.base_url {
            config.api.base_url = base_url.clone();
        }
        if let Some(customer) = &self.customer {
            config.api.customer_id = customer.clone();
        }
        if let Some(token) = &self.token {
            config.api.api_token = Some(token.clone());
        }
        config.validate()?;
        debug!(base_url = %config.api.base_url, "configuration loaded");
        Ok(config)
    }
}

/// Open an editor session over HTTP with notifications queued for the
/// terminal.
pub async fn open_session(
    config: &XreplConfig,
    group: &str,
) -> anyhow::Result<(EditorSession<HttpClient>, mpsc::UnboundedReceiver<Notification>)> {
    let api = Arc::new(HttpClient::new(&config.api)?);
    let (reporter, notifications) = ChannelReporter::new(config.api.clone());
    let session = EditorSession::open(
        api,
        Arc::new(GroupCache::new()),
        Arc::new(reporter),
        config.poll.clone(),
        group,
    )
    .await?;
    Ok((session, notifications))
}

/// Print queued notifications to stderr.
pub fn flush_notifications(notifications: &mut mpsc::UnboundedReceiver<Notification>) {
    while let Ok(notification) = notifications.try_recv() {
        eprintln!("✗ {notification}");
    }
}
