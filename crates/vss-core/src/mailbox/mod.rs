//! Agent mailboxes and the network roster

use crate::{AgentId, Error, Result};
use std::sync::Arc;
use std::time::Duration;

pub use ::async_trait::async_trait;

/// Inbox of a single agent
///
/// Any agent may enqueue at any time; only the owner dequeues. No ordering
/// is promised between different senders.
#[async_trait]
pub trait Mailbox<M: Send + 'static>: Send + Sync {
    /// Agent that owns this mailbox
    fn owner(&self) -> AgentId;

    /// Deliver a message without blocking the sender
    fn enqueue(&self, message: M) -> Result<()>;

    /// Next queued message, or `None` when the inbox is empty
    fn try_dequeue(&self) -> Option<M>;

    /// Wait up to `timeout` for the next message
    async fn dequeue_timeout(&self, timeout: Duration) -> Option<M>;

    /// Number of queued messages
    fn len(&self) -> usize;

    /// Whether the inbox is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory mailbox for local simulation
pub mod memory;

pub use memory::MemoryMailbox;

/// Immutable map from agent identity to mailbox handle
///
/// Built once before any agent runs and shared by reference afterwards.
pub struct Roster<M: Send + 'static> {
    mailboxes: Vec<Arc<dyn Mailbox<M>>>,
}

impl<M: Clone + Send + 'static> Roster<M> {
    /// Build a roster; mailbox `k` must belong to agent `k + 1`
    pub fn new(mailboxes: Vec<Arc<dyn Mailbox<M>>>) -> Result<Self> {
        for (position, mailbox) in mailboxes.iter().enumerate() {
            if mailbox.owner() != position + 1 {
                return Err(Error::InvalidAgentId(mailbox.owner()));
            }
        }
        Ok(Self { mailboxes })
    }

    /// Number of agents in the network
    pub fn len(&self) -> usize {
        self.mailboxes.len()
    }

    /// Whether the roster has no agents
    pub fn is_empty(&self) -> bool {
        self.mailboxes.is_empty()
    }

    /// All agent identities
    pub fn ids(&self) -> impl Iterator<Item = AgentId> {
        1..=self.mailboxes.len()
    }

    /// Mailbox handle of an agent
    pub fn mailbox(&self, id: AgentId) -> Result<&Arc<dyn Mailbox<M>>> {
        id.checked_sub(1)
            .and_then(|index| self.mailboxes.get(index))
            .ok_or(Error::InvalidAgentId(id))
    }

    /// Unicast to one agent
    pub fn send(&self, to: AgentId, message: M) -> Result<()> {
        self.mailbox(to)?.enqueue(message)
    }

    /// Deliver a copy to every agent except `from`
    ///
    /// Every recipient is attempted; the first failure is returned.
    pub fn broadcast(&self, from: AgentId, message: &M) -> Result<()> {
        let mut first_error = None;
        for mailbox in &self.mailboxes {
            if mailbox.owner() == from {
                continue;
            }
            if let Err(e) = mailbox.enqueue(message.clone()) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
