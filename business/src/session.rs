//! Session resolution and the host-integration channel.
//!
//! Two modes:
//! - **Hosted**: the shell passes a [`ShellContext`] at mount and keeps
//!   sending `SHELL_CONFIG_UPDATE` messages over the [`ShellChannel`] for the
//!   lifetime of the view.
//! - **Standalone**: no shell context; token, user record and theme flag come
//!   from [`SessionStorage`] under the shell's well-known keys.
//!
//! Either way the result lands in [`SessionConfig`] plus the document-wide
//! [`ThemeMarker`], and the only ongoing mutation path is
//! [`pump_shell_messages`]: messages are applied in arrival order on the
//! event loop, each handler running to completion. Dropping the channel is
//! the unsubscribe: senders held by the host start failing silently and no
//! listener dangles.

use conship_states::StateCtx;
use log::warn;

use crate::config::{ConfigPatch, SessionConfig, ShellContext};
use crate::storage::{SessionStorage, keys};
use crate::theme::ThemeMarker;

/// Runtime message from the hosting shell, a tagged union on the wire:
/// `{"type":"SHELL_CONFIG_UPDATE","payload":{...}}`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ShellMessage {
    #[serde(rename = "SHELL_CONFIG_UPDATE")]
    ConfigUpdate(ConfigPatch),
}

impl ShellMessage {
    /// Parse a raw cross-window message. Unknown tags and malformed payloads
    /// are not ours to handle; they are ignored.
    pub fn from_json(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

/// Host side of the channel; cheap to clone and hand to the shell bridge.
#[derive(Debug, Clone)]
pub struct ShellSender {
    tx: flume::Sender<ShellMessage>,
}

impl ShellSender {
    /// Post a typed message. Returns false once the view has torn down its
    /// channel.
    pub fn post(&self, message: ShellMessage) -> bool {
        self.tx.send(message).is_ok()
    }

    /// Post a raw JSON message as received from the cross-window transport.
    /// Messages that are not shell messages are dropped.
    pub fn post_json(&self, raw: &str) -> bool {
        match ShellMessage::from_json(raw) {
            Some(message) => self.post(message),
            None => false,
        }
    }
}

/// Inbound message channel owned by the view.
///
/// The receiving half lives and dies with the view: dropping the channel
/// unsubscribes every sender.
#[derive(Debug)]
pub struct ShellChannel {
    tx: flume::Sender<ShellMessage>,
    rx: flume::Receiver<ShellMessage>,
}

impl Default for ShellChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellChannel {
    pub fn new() -> Self {
        let (tx, rx) = flume::unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> ShellSender {
        ShellSender {
            tx: self.tx.clone(),
        }
    }

    fn drain(&self) -> impl Iterator<Item = ShellMessage> + '_ {
        self.rx.try_iter()
    }
}

/// Resolve the session at mount.
///
/// With a host context, adopt its fields (shallow merge over the defaults);
/// without one, fall back to persisted storage. Malformed stored user JSON is
/// treated as "no session" rather than an error. Always re-applies the theme
/// marker as a side effect.
pub fn resolve_session(
    ctx: &mut StateCtx,
    shell: Option<ShellContext>,
    storage: &dyn SessionStorage,
) {
    let dark = {
        let config = ctx.state_mut::<SessionConfig>();
        match shell {
            Some(context) => config.apply_patch(context),
            None => {
                config.token = storage.get(keys::AUTH_TOKEN);
                config.user = storage.get(keys::USER_DATA).and_then(|raw| {
                    match serde_json::from_str(&raw) {
                        Ok(user) => Some(user),
                        Err(err) => {
                            warn!("resolve_session: discarding malformed user_data: {err}");
                            None
                        }
                    }
                });
                config.dark_mode = storage
                    .get(keys::DARK_MODE)
                    .is_some_and(|value| value == "true");
            }
        }
        config.dark_mode
    };

    ctx.state_mut::<ThemeMarker>().apply(dark);
}

/// Drain the shell channel, merging each configuration update into
/// [`SessionConfig`] in arrival order.
///
/// The theme marker is re-applied only when a payload carries `isDarkMode`.
/// Returns the number of messages processed.
pub fn pump_shell_messages(ctx: &mut StateCtx, channel: &ShellChannel) -> usize {
    let mut processed = 0;
    let messages: Vec<ShellMessage> = channel.drain().collect();
    for message in messages {
        match message {
            ShellMessage::ConfigUpdate(patch) => {
                let dark = patch.is_dark_mode;
                ctx.state_mut::<SessionConfig>().apply_patch(patch);
                if let Some(dark) = dark {
                    ctx.state_mut::<ThemeMarker>().apply(dark);
                }
            }
        }
        processed += 1;
    }
    processed
}

/// The blocking precondition gate in front of the directory view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionGate {
    /// Token and user resolved; the view may fetch and mutate.
    Ready,
    /// No usable session; render the authentication-required placeholder and
    /// perform no API calls.
    AuthenticationRequired,
}

pub fn session_gate(config: &SessionConfig) -> SessionGate {
    if config.is_authenticated() {
        SessionGate::Ready
    } else {
        SessionGate::AuthenticationRequired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_message_tag_is_ignored() {
        assert!(ShellMessage::from_json(r#"{"type":"SHELL_PING","payload":{}}"#).is_none());
        assert!(ShellMessage::from_json("not json").is_none());
    }

    #[test]
    fn config_update_parses() {
        let message =
            ShellMessage::from_json(r#"{"type":"SHELL_CONFIG_UPDATE","payload":{"isDarkMode":true}}"#)
                .unwrap();
        let ShellMessage::ConfigUpdate(patch) = message;
        assert_eq!(patch.is_dark_mode, Some(true));
    }

    #[test]
    fn dropping_channel_unsubscribes_sender() {
        let channel = ShellChannel::new();
        let sender = channel.sender();
        drop(channel);
        assert!(!sender.post(ShellMessage::ConfigUpdate(ConfigPatch::default())));
    }
}
