use std::any::TypeId;
use std::collections::HashMap;

use log::warn;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::command::{Command, CommandSnapshot, PendingUpdate, Updater};
use crate::state::State;

/// Type-keyed registry of states and commands.
///
/// The context is single-threaded by construction: all reads and mutations
/// happen on the owning thread (the UI event loop). Async commands run on
/// tokio tasks against an immutable snapshot and publish results back through
/// a channel, drained by [`StateCtx::apply_pending`].
pub struct StateCtx {
    states: HashMap<TypeId, Box<dyn State>>,
    commands: HashMap<TypeId, Box<dyn Command>>,
    pending_tx: flume::Sender<PendingUpdate>,
    pending_rx: flume::Receiver<PendingUpdate>,
    cancel: CancellationToken,
}

impl Default for StateCtx {
    fn default() -> Self {
        Self::new()
    }
}

impl StateCtx {
    pub fn new() -> Self {
        let (pending_tx, pending_rx) = flume::unbounded();
        Self {
            states: HashMap::new(),
            commands: HashMap::new(),
            pending_tx,
            pending_rx,
            cancel: CancellationToken::new(),
        }
    }

    /// Register a state. Later registrations of the same type replace earlier
    /// ones.
    pub fn add_state<T: State>(&mut self, state: T) {
        self.states.insert(TypeId::of::<T>(), Box::new(state));
    }

    /// Register a command for later [`StateCtx::dispatch`].
    pub fn record_command<C: Command>(&mut self, command: C) {
        self.commands.insert(TypeId::of::<C>(), Box::new(command));
    }

    /// Read a registered state.
    ///
    /// # Panics
    ///
    /// Panics when `T` was never registered; registration happens once at app
    /// setup, so a miss is a wiring bug.
    pub fn state<T: State>(&self) -> &T {
        self.states
            .get(&TypeId::of::<T>())
            .and_then(|state| state.as_any().downcast_ref::<T>())
            .unwrap_or_else(|| panic!("StateCtx: state {} not registered", std::any::type_name::<T>()))
    }

    /// Mutably read a registered state. Panics like [`StateCtx::state`].
    pub fn state_mut<T: State>(&mut self) -> &mut T {
        self.states
            .get_mut(&TypeId::of::<T>())
            .and_then(|state| state.as_any_mut().downcast_mut::<T>())
            .unwrap_or_else(|| panic!("StateCtx: state {} not registered", std::any::type_name::<T>()))
    }

    /// Mutate a registered state in place.
    pub fn update<T: State>(&mut self, f: impl FnOnce(&mut T)) {
        f(self.state_mut::<T>());
    }

    /// Write handle for publishing state replacements from outside a command
    /// (tests, bridge code).
    pub fn updater(&self) -> Updater {
        Updater::new(self.pending_tx.clone())
    }

    /// Capture a snapshot of every snapshot-capable state.
    pub fn snapshot(&self) -> CommandSnapshot {
        let states = self
            .states
            .iter()
            .filter_map(|(type_id, state)| state.snapshot().map(|boxed| (*type_id, boxed)))
            .collect();
        CommandSnapshot::new(states)
    }

    /// Dispatch a recorded command on the tokio runtime.
    ///
    /// The returned handle lets callers await completion (tests do); normal
    /// call sites drop it and rely on [`StateCtx::apply_pending`] to pick up
    /// the results later.
    ///
    /// # Panics
    ///
    /// Panics when `C` was never recorded, or when called outside a tokio
    /// runtime context.
    pub fn dispatch<C: Command>(&self) -> JoinHandle<()> {
        let command = self
            .commands
            .get(&TypeId::of::<C>())
            .unwrap_or_else(|| panic!("StateCtx: command {} not recorded", std::any::type_name::<C>()));
        let future = command.run(self.snapshot(), self.updater(), self.cancel.child_token());
        tokio::spawn(future)
    }

    /// Drain queued state replacements, applying them in arrival order.
    ///
    /// Returns the number of updates applied. Must be called from the owning
    /// thread; this is the single point where command results become visible.
    pub fn apply_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok((type_id, boxed)) = self.pending_rx.try_recv() {
            match self.states.get_mut(&type_id) {
                Some(state) => {
                    state.assign_box(boxed);
                    applied += 1;
                }
                None => warn!("StateCtx: dropped pending update for unregistered state"),
            }
        }
        applied
    }

    /// Dispatch `C`, await its completion, then apply its updates.
    ///
    /// Convenience for tests and sequential flows; production loops dispatch
    /// and apply independently.
    pub async fn dispatch_and_sync<C: Command>(&mut self) -> usize {
        let handle = self.dispatch::<C>();
        if let Err(err) = handle.await {
            warn!("StateCtx: command task failed: {err}");
        }
        self.apply_pending()
    }

    /// Cancel all in-flight command futures. Called on teardown.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}
