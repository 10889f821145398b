use tokio::spawn;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error};

use crate::models::WalletError;
use crate::types::WalletId;

/// A unit of work queued on a wallet's actor.
type WalletJob = Box<dyn FnOnce() + Send + 'static>;

/// Runs every operation for one wallet in arrival order.
///
/// Two workflows touching the same wallet can never interleave their check and write steps,
/// because only this task runs them.
pub struct WalletActor {
    wallet_id: WalletId,
    sender: mpsc::UnboundedSender<WalletJob>,
    handle: JoinHandle<()>
}

impl WalletActor {
    pub fn new(wallet_id: WalletId) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<WalletJob>();

        let handle = spawn(async move {
            while let Some(job) = receiver.recv().await {
                job();
            }

            debug!("Wallet actor [{wallet_id}] drained its queue");
        });

        Self {
            wallet_id,
            sender,
            handle
        }
    }

    pub fn wallet_id(&self) -> WalletId {
        self.wallet_id
    }

    /// A cloneable handle for submitting work and awaiting the result.
    ///
    /// Mailboxes keep the queue open, so drop them before calling [`WalletActor::despawn`].
    pub fn mailbox(&self) -> WalletMailbox {
        WalletMailbox {
            wallet_id: self.wallet_id,
            sender: self.sender.clone()
        }
    }

    /// Closes the queue and waits for the jobs already in it to finish.
    pub async fn despawn(self) -> Result<(), JoinError> {
        drop(self.sender);
        self.handle.await
    }
}

#[derive(Clone)]
pub struct WalletMailbox {
    wallet_id: WalletId,
    sender: mpsc::UnboundedSender<WalletJob>
}

impl WalletMailbox {
    /// Runs the operation on the actor and returns its result.
    ///
    /// If the caller stops waiting (for example after a timeout) before the job reaches the front
    /// of the queue, the operation is skipped. An operation that has already started runs to
    /// completion and may still commit.
    ///
    /// # Errors
    /// `EngineUnavailable` when the actor has stopped before replying.
    pub async fn execute<T, F>(&self, operation: F) -> Result<T, WalletError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, WalletError> + Send + 'static
    {
        let wallet_id = self.wallet_id;
        let (reply, response) = oneshot::channel();

        let job: WalletJob = Box::new(move || {
            if reply.is_closed() {
                debug!("Skipping abandoned operation for wallet [{wallet_id}]");
                return;
            }

            if reply.send(operation()).is_err() {
                debug!("Result for wallet [{wallet_id}] was dropped by its caller");
            }
        });

        if self.sender.send(job).is_err() {
            error!("Wallet actor [{wallet_id}] is not accepting work");
            return Err(WalletError::engine_unavailable(wallet_id))
        }

        response.await.map_err(|_| WalletError::engine_unavailable(wallet_id))?
    }
}
