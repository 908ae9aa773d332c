use crate::session::{AuthClient, Bootstrap, ClientConfig, FileStore, SessionStore};
use anyhow::{anyhow, Result};
use std::{path::PathBuf, time::Duration};

/// Connection and storage settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub api_url: String,
    pub session_file: PathBuf,
    pub timeout: Option<Duration>,
}

impl GlobalArgs {
    /// Falls back to the platform data directory when no session file is given.
    ///
    /// # Errors
    /// Returns an error if no session file was given and the platform has no
    /// local data directory.
    pub fn new(
        api_url: String,
        session_file: Option<PathBuf>,
        timeout_seconds: Option<u64>,
    ) -> Result<Self> {
        let session_file = session_file
            .or_else(FileStore::default_path)
            .ok_or_else(|| anyhow!("no local data directory; pass --session-file"))?;

        Ok(Self {
            api_url,
            session_file,
            timeout: timeout_seconds.map(Duration::from_secs),
        })
    }

    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_base_url: self.api_url.clone(),
            timeout: self.timeout,
        }
    }

    /// Composition root: one client and one durable store for the process.
    ///
    /// # Errors
    /// Returns an error if the API client cannot be built or the stored session
    /// cannot be read.
    pub fn bootstrap(&self) -> Result<Bootstrap<FileStore>> {
        let client = AuthClient::new(&self.client_config())?;
        let store = SessionStore::new(FileStore::new(&self.session_file));
        let bootstrap = Bootstrap::new(client, store);
        bootstrap.resume()?;
        Ok(bootstrap)
    }
}
