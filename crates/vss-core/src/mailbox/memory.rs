//! In-memory mailbox implementation

use super::{async_trait, Mailbox};
use crate::{AgentId, Error, Result};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;
use tracing::warn;

/// Bounded in-memory FIFO for a single agent, backed by a tokio channel
pub struct MemoryMailbox<M> {
    /// Owning agent
    owner: AgentId,
    /// Maximum number of queued messages
    capacity: usize,
    /// Shared by every sender; never dropped, so the channel stays open
    sender: mpsc::Sender<M>,
    /// Owner's end of the channel
    receiver: Mutex<mpsc::Receiver<M>>,
}

impl<M> MemoryMailbox<M> {
    /// Create an empty mailbox for `owner` holding at least one message
    pub fn new(owner: AgentId, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        Self {
            owner,
            capacity,
            sender,
            receiver: Mutex::new(receiver),
        }
    }

    /// Maximum number of queued messages
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[async_trait]
impl<M: Send + 'static> Mailbox<M> for MemoryMailbox<M> {
    fn owner(&self) -> AgentId {
        self.owner
    }

    fn enqueue(&self, message: M) -> Result<()> {
        self.sender.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => {
                warn!(agent = self.owner, capacity = self.capacity, "Mailbox full");
                Error::MailboxFull {
                    agent: self.owner,
                    capacity: self.capacity,
                }
            }
            TrySendError::Closed(_) => {
                Error::Internal(format!("Mailbox of agent {} is closed", self.owner))
            }
        })
    }

    fn try_dequeue(&self) -> Option<M> {
        // only the owner dequeues, so the lock is free unless a timed wait is pending
        self.receiver.try_lock().ok()?.try_recv().ok()
    }

    async fn dequeue_timeout(&self, timeout: Duration) -> Option<M> {
        let mut receiver = self.receiver.lock().await;
        tokio::time::timeout(timeout, receiver.recv())
            .await
            .ok()
            .flatten()
    }

    fn len(&self) -> usize {
        self.capacity - self.sender.capacity()
    }
}
