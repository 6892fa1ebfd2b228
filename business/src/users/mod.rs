//! User administration: the managed-users directory and its mutations.
//!
//! Data flow, in order: a [`commands`] command calls the [`api`] client and
//! publishes into its cache, [`reconcile::reconcile_directory`] folds the
//! caches into [`state::DirectoryState`], and the view reads that state. The
//! [`hierarchy`] step sits between the flat wire list and display.

pub mod api;
pub mod commands;
pub mod hierarchy;
pub mod reconcile;
pub mod state;
pub mod types;

pub use api::{ApiError, ApiResult};
pub use commands::{
    CreateUserCache, CreateUserCommand, CreateUserInput, FetchManagedUsersCommand, RequestPhase,
    UpdateModulesCache, UpdateModulesCommand, UpdateModulesInput, UsersFetchCache,
};
pub use hierarchy::{UserNode, organize_hierarchy};
pub use reconcile::reconcile_directory;
pub use state::{
    CreateUserForm, DirectoryState, DirectoryStats, EditPermissionsForm, RoleFilter,
};
pub use types::{
    ApiErrorBody, CreateUserRequest, CreateUserResponse, ListUsersResponse, ModuleGrant, ModuleId,
    Permission, Role, UpdateModulesRequest, UpdateModulesResponse, UserAccount,
};
