//! Business logic for the Conship user-administration panel.
//!
//! The panel runs embedded in a host shell or standalone. This crate owns
//! everything below the rendering layer: session adoption ([`session`],
//! [`config`], [`storage`], [`theme`]) and the managed-users directory
//! ([`users`]). All state lives in a [`conship_states::StateCtx`]; network IO
//! runs only inside dispatched commands.
//!
//! A host embedding the panel drives one loop iteration per frame or message:
//!
//! ```ignore
//! let handled = pump_shell_messages(&mut ctx, &channel);
//! ctx.apply_pending();
//! if reconcile_directory(&mut ctx, Utc::now()) {
//!     ctx.dispatch::<FetchManagedUsersCommand>();
//! }
//! ```

pub mod config;
pub mod http;
pub mod notification;
pub mod session;
pub mod storage;
pub mod theme;
pub mod users;

pub use config::{ConfigPatch, SessionConfig, ShellContext};
pub use notification::{Notification, NotificationKind};
pub use session::{
    SessionGate, ShellChannel, ShellMessage, ShellSender, pump_shell_messages, resolve_session,
    session_gate,
};
pub use storage::{MemoryStorage, SessionStorage};
pub use theme::ThemeMarker;
