use std::any::Any;

use log::warn;

/// A unit of application state stored in a [`crate::StateCtx`].
///
/// States are plain structs owned by the context. Two optional hooks connect a
/// state to the async command machinery:
///
/// - [`State::snapshot`] returns a boxed `Send` clone so the state can be read
///   inside a command future. States that are never read by commands keep the
///   default (`None`) and are simply absent from snapshots.
/// - [`State::assign_box`] applies a boxed replacement value published through
///   an [`crate::Updater`]. States that are never written by commands keep the
///   default no-op.
pub trait State: Any {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Boxed `Send` clone captured into a [`crate::CommandSnapshot`].
    fn snapshot(&self) -> Option<Box<dyn Any + Send>> {
        None
    }

    /// Apply a replacement value published by a command.
    fn assign_box(&mut self, _new_self: Box<dyn Any + Send>) {}
}

/// Downcast-assign helper for [`State::assign_box`] implementations.
///
/// A type mismatch means an `Updater::set` was routed to the wrong state
/// registration; the update is dropped with a warning rather than panicking,
/// since this runs on the event loop.
pub fn state_assign_impl<T: State>(dst: &mut T, new_self: Box<dyn Any + Send>) {
    match new_self.downcast::<T>() {
        Ok(new_self) => *dst = *new_self,
        Err(_) => warn!(
            "state_assign_impl: dropped update with mismatched type for {}",
            std::any::type_name::<T>()
        ),
    }
}
