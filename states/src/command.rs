use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use flume::Sender;
use tokio_util::sync::CancellationToken;

/// A boxed state value travelling through the pending-update channel.
pub type BoxedState = Box<dyn Any + Send>;

pub(crate) type PendingUpdate = (TypeId, BoxedState);

/// Immutable view of snapshot-capable states, taken at dispatch time.
///
/// A snapshot decouples a command future from the context that dispatched it:
/// the future owns cloned values and never borrows the `StateCtx`, so the
/// event loop stays free while the command runs.
pub struct CommandSnapshot {
    states: HashMap<TypeId, BoxedState>,
}

impl CommandSnapshot {
    pub(crate) fn new(states: HashMap<TypeId, BoxedState>) -> Self {
        Self { states }
    }

    /// Read a state captured in this snapshot.
    ///
    /// # Panics
    ///
    /// Panics when `T` was not registered, or was registered without a
    /// [`crate::State::snapshot`] implementation. Both are wiring mistakes
    /// made at app setup, not runtime conditions.
    pub fn state<T: Any>(&self) -> &T {
        self.states
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
            .unwrap_or_else(|| {
                panic!(
                    "CommandSnapshot: state {} was not captured (missing snapshot impl?)",
                    std::any::type_name::<T>()
                )
            })
    }
}

/// Write handle passed into command futures.
///
/// `set` publishes a full replacement value for a registered state. Values are
/// queued on a channel and applied by [`crate::StateCtx::apply_pending`] on
/// the owning thread, in arrival order. When two in-flight commands publish
/// the same state, the last-resolved value wins; superseded requests are not
/// cancelled.
#[derive(Clone)]
pub struct Updater {
    tx: Sender<PendingUpdate>,
}

impl Updater {
    pub(crate) fn new(tx: Sender<PendingUpdate>) -> Self {
        Self { tx }
    }

    /// Queue a replacement value for state `T`.
    ///
    /// Silently drops the value when the owning `StateCtx` has been torn
    /// down; a late command completion after teardown is not an error.
    pub fn set<T: Any + Send>(&self, value: T) {
        let _ = self.tx.send((TypeId::of::<T>(), Box::new(value)));
    }
}

/// A manual-only side effect, dispatched explicitly via
/// [`crate::StateCtx::dispatch`].
///
/// Commands are where network IO lives. A command reads its inputs from the
/// snapshot, performs the effect, and publishes results through the
/// [`Updater`]; it never touches states directly.
pub trait Command: Any + Send + Sync {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: Updater,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = ()> + Send>>;
}
