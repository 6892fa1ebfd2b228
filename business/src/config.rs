//! Session configuration and the shell merge contract.
//!
//! `SessionConfig` is the immutable-per-render configuration value the rest of
//! the crate reads: API base URL, theme flag, current user, bearer token. It
//! is registered once in the `StateCtx` and mutated only through the two
//! entry points in [`crate::session`]: initial resolution at mount, and
//! host-originated configuration-update messages.

use std::any::Any;

use conship_states::{State, state_assign_impl};
use serde::{Deserialize, Serialize};

use crate::users::{Role, UserAccount};

/// Build-time default for the API base URL, used when neither the host nor a
/// patch supplies one.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3001";

/// Partial configuration supplied by the hosting shell.
///
/// This is both the init context handed over at mount and the payload of a
/// `SHELL_CONFIG_UPDATE` runtime message: any subset of fields may be present
/// and is merged shallowly. Field names follow the host's wire format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigPatch {
    pub api_url: Option<String>,
    pub is_dark_mode: Option<bool>,
    pub user: Option<UserAccount>,
    pub token: Option<String>,
}

/// The init context object a hosting shell passes at mount. Same shape as a
/// runtime patch.
pub type ShellContext = ConfigPatch;

/// Resolved session configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub api_base_url: String,
    pub dark_mode: bool,
    pub user: Option<UserAccount>,
    pub token: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            dark_mode: false,
            user: None,
            token: None,
        }
    }
}

impl SessionConfig {
    /// Shallow merge: present patch fields overwrite, absent fields keep
    /// their prior value. Pure; the transport lives in [`crate::session`].
    pub fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(api_url) = patch.api_url {
            self.api_base_url = api_url;
        }
        if let Some(dark) = patch.is_dark_mode {
            self.dark_mode = dark;
        }
        if let Some(user) = patch.user {
            self.user = Some(user);
        }
        if let Some(token) = patch.token {
            self.token = Some(token);
        }
    }

    /// The hard precondition for every API call: both a token and a user
    /// record must be present.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn current_role(&self) -> Option<Role> {
        self.user.as_ref().map(|user| user.role)
    }
}

impl State for SessionConfig {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn snapshot(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.clone()))
    }

    fn assign_box(&mut self, new_self: Box<dyn Any + Send>) {
        state_assign_impl(self, new_self);
    }
}
