//! Directory commands and their compute-shaped caches.
//!
//! Side effects (network IO) must not run inside state transitions, so each
//! API operation is a manual-only [`Command`]: the UI writes an input state,
//! dispatches, and the command publishes its progress into a cache that the
//! reconcile step consumes. Caches only ever move through
//! `Idle → Pending → Success | Error`.
//!
//! The commands perform no role-permission checks; the role-creation map is a
//! UI gate and the server re-validates. A dispatch without a usable session
//! is skipped entirely; the session gate means no API calls without a token.

use std::any::Any;

use conship_states::{Command, CommandSnapshot, State, Updater, state_assign_impl};
use log::{error, info, warn};
use ustr::Ustr;

use crate::config::SessionConfig;
use crate::users::api::{self, ApiError};
use crate::users::{CreateUserRequest, CreateUserResponse, ModuleGrant, UpdateModulesResponse, UserAccount};

/// Lifecycle of one request, stored in a cache state.
#[derive(Debug, Clone, Default)]
pub enum RequestPhase<T> {
    #[default]
    Idle,
    Pending,
    Success(T),
    Error(ApiError),
}

impl<T> RequestPhase<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, RequestPhase::Pending)
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            RequestPhase::Error(err) => Some(err),
            _ => None,
        }
    }
}

macro_rules! cache_state {
    ($(#[$doc:meta])* $name:ident, $ok:ty) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default)]
        pub struct $name {
            pub phase: RequestPhase<$ok>,
        }

        impl State for $name {
            fn as_any(&self) -> &dyn Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }

            fn assign_box(&mut self, new_self: Box<dyn Any + Send>) {
                state_assign_impl(self, new_self);
            }
        }
    };
}

cache_state!(
    /// Latest status of the managed-users list fetch. Holds the *flat* list;
    /// hierarchy reconstruction happens at reconcile time.
    UsersFetchCache,
    Vec<UserAccount>
);

cache_state!(
    /// Latest status of a create-user submission.
    CreateUserCache,
    CreateUserResponse
);

cache_state!(
    /// Latest status of a module-grants update.
    UpdateModulesCache,
    UpdateModulesResponse
);

/// Input for [`CreateUserCommand`]; set by the create modal before dispatch.
#[derive(Debug, Clone, Default)]
pub struct CreateUserInput {
    /// `None` means "no request intended" and the command is a no-op.
    pub request: Option<CreateUserRequest>,
}

impl State for CreateUserInput {
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

/// Input for [`UpdateModulesCommand`]; set by the permissions modal before
/// dispatch.
#[derive(Debug, Clone, Default)]
pub struct UpdateModulesInput {
    pub user_id: Option<Ustr>,
    pub modules: Vec<ModuleGrant>,
}

impl State for UpdateModulesInput {
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

/// Borrow the session pieces a command needs, or skip the dispatch.
fn session_parts(config: &SessionConfig) -> Option<(&str, &str)> {
    match config.bearer_token() {
        Some(token) => Some((config.api_base_url.as_str(), token)),
        None => {
            warn!("directory command skipped: no session token");
            None
        }
    }
}

/// Fetch the flat managed-users list.
///
/// Superseded fetches are not cancelled; the last-resolved response wins when
/// the caches are applied in arrival order.
#[derive(Debug, Default)]
pub struct FetchManagedUsersCommand;

impl Command for FetchManagedUsersCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: Updater,
        _cancel: tokio_util::sync::CancellationToken,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>> {
        let config: SessionConfig = snap.state::<SessionConfig>().clone();

        Box::pin(async move {
            let Some((base_url, token)) = session_parts(&config) else {
                return;
            };

            updater.set(UsersFetchCache {
                phase: RequestPhase::Pending,
            });

            match api::list_managed_users(base_url, token).await {
                Ok(users) => {
                    info!("fetched {} managed users", users.len());
                    updater.set(UsersFetchCache {
                        phase: RequestPhase::Success(users),
                    });
                }
                Err(err) => {
                    error!("managed users fetch failed: {err}");
                    updater.set(UsersFetchCache {
                        phase: RequestPhase::Error(err),
                    });
                }
            }
        })
    }
}

/// Submit the create-user form.
#[derive(Debug, Default)]
pub struct CreateUserCommand;

impl Command for CreateUserCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: Updater,
        _cancel: tokio_util::sync::CancellationToken,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>> {
        let config: SessionConfig = snap.state::<SessionConfig>().clone();
        let input: CreateUserInput = snap.state::<CreateUserInput>().clone();

        Box::pin(async move {
            let Some(request) = input.request else {
                info!("CreateUserCommand: no request set, skipping");
                return;
            };
            let Some((base_url, token)) = session_parts(&config) else {
                return;
            };

            updater.set(CreateUserCache {
                phase: RequestPhase::Pending,
            });

            match api::create_user(base_url, token, &request).await {
                Ok(response) => {
                    updater.set(CreateUserCache {
                        phase: RequestPhase::Success(response),
                    });
                }
                Err(err) => {
                    error!("create user failed: {err}");
                    updater.set(CreateUserCache {
                        phase: RequestPhase::Error(err),
                    });
                }
            }
        })
    }
}

/// Submit a module-grants update for one user.
#[derive(Debug, Default)]
pub struct UpdateModulesCommand;

impl Command for UpdateModulesCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: Updater,
        _cancel: tokio_util::sync::CancellationToken,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>> {
        let config: SessionConfig = snap.state::<SessionConfig>().clone();
        let input: UpdateModulesInput = snap.state::<UpdateModulesInput>().clone();

        Box::pin(async move {
            let Some(user_id) = input.user_id else {
                info!("UpdateModulesCommand: no target user set, skipping");
                return;
            };
            let Some((base_url, token)) = session_parts(&config) else {
                return;
            };

            updater.set(UpdateModulesCache {
                phase: RequestPhase::Pending,
            });

            match api::update_user_modules(base_url, token, user_id.as_str(), &input.modules).await
            {
                Ok(response) => {
                    updater.set(UpdateModulesCache {
                        phase: RequestPhase::Success(response),
                    });
                }
                Err(err) => {
                    error!("module update failed for {user_id}: {err}");
                    updater.set(UpdateModulesCache {
                        phase: RequestPhase::Error(err),
                    });
                }
            }
        })
    }
}
