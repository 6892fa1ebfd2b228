//! Typed state container for the user-administration client.
//!
//! The model is deliberately small:
//! - [`State`]: a plain struct registered in a [`StateCtx`], read and mutated
//!   only on the owning thread.
//! - [`Command`]: an explicit, manual-only side effect (network IO). It runs
//!   as a tokio task against an immutable [`CommandSnapshot`] and publishes
//!   replacement state values through an [`Updater`].
//! - [`StateCtx::apply_pending`]: the single reconciliation entry point where
//!   published values are applied, in arrival order.
//!
//! There is no implicit execution and no shared mutable state across threads:
//! commands communicate only through the pending-update channel.

mod command;
mod ctx;
mod state;

pub use command::{BoxedState, Command, CommandSnapshot, Updater};
pub use ctx::StateCtx;
pub use state::{State, state_assign_impl};
