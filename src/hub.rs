use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError, mpsc::Sender},
};

use log::debug;

use crate::{Id, message::Event};

/// One subscriber's outgoing line channel.
///
/// The receiving end is drained by that connection's writer thread, so a
/// slow socket never stalls the sender.
#[derive(Clone, Debug)]
pub struct Messenger(Sender<String>);

impl Messenger {
    #[must_use]
    pub fn new(sender: Sender<String>) -> Self {
        Self(sender)
    }

    /// Returns false once the receiving end is gone.
    #[must_use]
    pub fn send(&self, line: String) -> bool {
        self.0.send(line).is_ok()
    }
}

/// Registry of live subscribers with fan-out of state-change events.
///
/// Guarded by its own lock, independent of the tournament model, so
/// subscriber churn never contends with mutations. A subscriber whose
/// channel is closed is dropped from the registry as a side effect of the
/// publish that discovers it.
#[derive(Default)]
pub struct BroadcastHub {
    subscribers: Mutex<HashMap<Id, Messenger>>,
}

impl BroadcastHub {
    /// Registers a subscriber and immediately delivers the full-state
    /// snapshot, so no subscriber ever starts from a partial view.
    ///
    /// # Errors
    ///
    /// If the snapshot fails to serialize.
    pub fn subscribe(&self, id: Id, messenger: Messenger, init: &Event) -> anyhow::Result<()> {
        let line = init.to_line()?;
        let mut subscribers = self.lock();

        if messenger.send(line) {
            subscribers.insert(id, messenger);
        }

        Ok(())
    }

    /// Removing an unknown subscriber is a no-op.
    pub fn unsubscribe(&self, id: Id) {
        self.lock().remove(&id);
    }

    /// Delivers the event to every live subscriber and prunes the dead
    /// ones.
    ///
    /// # Errors
    ///
    /// If the event fails to serialize; individual subscriber failures are
    /// not errors.
    pub fn publish(&self, event: &Event) -> anyhow::Result<()> {
        let line = event.to_line()?;
        let mut subscribers = self.lock();

        let dead: Vec<Id> = subscribers
            .iter()
            .filter(|(_, messenger)| !messenger.send(line.clone()))
            .map(|(id, _)| *id)
            .collect();

        for id in dead {
            debug!("dropping dead subscriber {id}");
            subscribers.remove(&id);
        }

        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Id, Messenger>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
