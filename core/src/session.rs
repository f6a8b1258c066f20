//! Session - the single owner of the current snapshot
//!
//! The registry itself is a plain value. A session holds the latest one,
//! feeds operations through it, and tells observers about every accepted
//! change. Observers run after the transition has finished; they never see
//! a half-applied state and cannot change the snapshot they are shown.

use log::debug;

use crate::config::RegistryConfig;
use crate::disk::manager::{DiskRegistry, Operation};
use crate::error::Result;

/// Callback run after each accepted operation.
pub type Observer = Box<dyn FnMut(&Operation, &DiskRegistry)>;

pub struct Session {
    state: DiskRegistry,
    observers: Vec<Observer>,
}

impl Session {
    pub fn new(config: RegistryConfig) -> Self {
        Self::from_state(DiskRegistry::new(config))
    }

    pub fn from_state(state: DiskRegistry) -> Self {
        Self {
            state,
            observers: Vec::new(),
        }
    }

    /// Current snapshot.
    pub fn state(&self) -> &DiskRegistry {
        &self.state
    }

    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&Operation, &DiskRegistry) + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Apply an operation. On rejection the snapshot is kept and nobody is
    /// notified.
    pub fn dispatch(&mut self, op: Operation) -> Result<&DiskRegistry> {
        let next = self.state.try_dispatch(op.clone())?;
        let changed = next != self.state;
        self.state = next;

        if changed {
            debug!("session: notifying {} observer(s)", self.observers.len());
            for observer in &mut self.observers {
                observer(&op, &self.state);
            }
        }
        Ok(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::manager::DiskId;
    use crate::disk::partition::FileSystem;
    use crate::error::AllocError;
    use std::cell::RefCell;
    use std::rc::Rc;
    use test_log::test;

    #[test]
    fn test_observers_see_accepted_changes_only() {
        let mut session = Session::new(RegistryConfig::preinstalled());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        session.subscribe(move |_, state| sink.borrow_mut().push(state.disk_count()));

        let reserved = session.state().disk("disk-0").unwrap().extents.get(0).unwrap().id;
        let rejected = session.dispatch(Operation::DeletePartition {
            disk: DiskId::from("disk-0"),
            extent: reserved,
        });
        assert_eq!(rejected.unwrap_err(), AllocError::ProtectedExtent);
        assert!(seen.borrow().is_empty());

        session.dispatch(Operation::AddRemovableDisk).unwrap();
        // Second attach changes nothing
        session.dispatch(Operation::AddRemovableDisk).unwrap();
        assert_eq!(*seen.borrow(), vec![2]);
    }

    #[test]
    fn test_dispatch_replaces_state() {
        let mut session = Session::new(RegistryConfig::default());
        let before = session.state().clone();
        let free = before.disk("disk-0").unwrap().extents.get(0).unwrap().id;

        session
            .dispatch(Operation::CreatePartition {
                disk: DiskId::from("disk-0"),
                extent: free,
                size_mb: 4096,
                letter: None,
                label: "Scratch".into(),
                filesystem: FileSystem::ExFat,
            })
            .unwrap();

        assert_eq!(before.disk("disk-0").unwrap().extents.len(), 1);
        assert_eq!(session.state().disk("disk-0").unwrap().extents.len(), 2);
    }
}
