//! Device-managed release actions.
//!
//! Every resource a driver acquires while probing is paired with an action
//! registered here. The bus runs the list in reverse registration order when
//! probing fails or the device goes away, so partial initialization never
//! leaks anything.

use core::fmt;

use parking_lot::Mutex;

use crate::error::{OffloadError, Result};

type Action = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct DevresState {
    actions: Vec<(&'static str, Action)>,
    closed: bool,
}

pub struct Devres {
    owner: String,
    state: Mutex<DevresState>,
}

impl Devres {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            state: Mutex::new(DevresState::default()),
        }
    }

    /// Register `action` to run at teardown.
    ///
    /// If the owner has already been torn down the action runs immediately
    /// and [`OffloadError::DeviceGone`] is returned.
    pub fn add_action_or_reset<F>(&self, name: &'static str, action: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.state.lock();
        if state.closed {
            drop(state);
            log::warn!("{}: late release action {name}, running now", self.owner);
            action();
            return Err(OffloadError::DeviceGone(self.owner.clone()));
        }
        state.actions.push((name, Box::new(action)));
        Ok(())
    }

    /// Run every registered action, newest first, and close the list.
    ///
    /// Returns how many actions ran. Calling it again runs nothing.
    pub fn release_all(&self) -> usize {
        let actions = {
            let mut state = self.state.lock();
            state.closed = true;
            core::mem::take(&mut state.actions)
        };

        let count = actions.len();
        for (name, action) in actions.into_iter().rev() {
            log::debug!("{}: release {name}", self.owner);
            action();
        }
        count
    }

    /// Accept actions again, ahead of a new probe attempt.
    pub fn reopen(&self) {
        self.state.lock().closed = false;
    }

    pub fn len(&self) -> usize {
        self.state.lock().actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of pending actions in registration order.
    pub fn pending(&self) -> Vec<&'static str> {
        self.state.lock().actions.iter().map(|(name, _)| *name).collect()
    }
}

impl fmt::Debug for Devres {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Devres")
            .field("owner", &self.owner)
            .field("pending", &self.pending())
            .finish()
    }
}
