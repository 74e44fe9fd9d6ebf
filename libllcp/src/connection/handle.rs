// libllcp-rs/libllcp/src/connection/handle.rs

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Handle on a connection worker running in its own task.
///
/// `stop()` asks the worker to finish at its next safe point and waits for
/// it; the worker sees `Error::Disconnected` from whatever it was awaiting.
#[derive(Debug)]
pub struct WorkerHandle {
    local_sap: u8,
    remote_sap: u8,
    token: CancellationToken,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    pub(crate) fn new(
        local_sap: u8,
        remote_sap: u8,
        token: CancellationToken,
        join: JoinHandle<()>,
    ) -> Self {
        Self {
            local_sap,
            remote_sap,
            token,
            join,
        }
    }

    /// Local SAP of the connection
    pub fn local_sap(&self) -> u8 {
        self.local_sap
    }

    /// Remote SAP of the connection
    pub fn remote_sap(&self) -> u8 {
        self.remote_sap
    }

    /// Whether the worker task has returned
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Request cooperative termination and wait for the worker to return.
    pub async fn stop(self) -> Result<()> {
        self.token.cancel();
        self.wait().await
    }

    /// Wait for the worker to return on its own.
    pub async fn wait(self) -> Result<()> {
        self.join
            .await
            .map_err(|e| Error::InvalidState(format!("connection worker failed: {}", e)))
    }
}
