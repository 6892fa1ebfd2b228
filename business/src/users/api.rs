//! Managed-users API client.
//!
//! Network IO for the directory view, called from commands only. Every
//! request carries the session's bearer token. Responses are decoded into the
//! wire types in [`crate::users::types`]; non-success statuses are mapped to
//! [`ApiError::Status`] with the server's error body message when one is
//! present, so the UI can surface it verbatim.

use thiserror::Error;

use crate::http::{Client, RequestBuilder, Response};
use crate::users::{
    ApiErrorBody, CreateUserRequest, CreateUserResponse, ListUsersResponse, ModuleGrant,
    UpdateModulesRequest, UpdateModulesResponse, UserAccount,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, refused, reset).
    #[error("{0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("API returned status: {status}")]
    Status {
        status: u16,
        /// Server-provided error message, when the body carried one.
        message: Option<String>,
    },

    /// The body did not decode into the expected shape.
    #[error("failed to parse {what}: {detail}")]
    Parse { what: &'static str, detail: String },
}

impl ApiError {
    /// The server's own error message, if the failure carried one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } => message.as_deref(),
            ApiError::Transport(_) | ApiError::Parse { .. } => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

fn bearer(request: RequestBuilder, token: &str) -> RequestBuilder {
    request.header("authorization", format!("Bearer {token}"))
}

fn status_error(response: &Response) -> ApiError {
    let body: ApiErrorBody = response.json().unwrap_or_default();
    ApiError::Status {
        status: response.status,
        message: body.error.or(body.message),
    }
}

fn parse_error(what: &'static str) -> impl FnOnce(serde_json::Error) -> ApiError {
    move |err| ApiError::Parse {
        what,
        detail: err.to_string(),
    }
}

/// GET `/api/users/managed`: the flat user list for the actor's visible
/// scope.
pub async fn list_managed_users(api_base_url: &str, token: &str) -> ApiResult<Vec<UserAccount>> {
    let url = format!("{api_base_url}/api/users/managed");

    let response = bearer(Client::get(&url), token)
        .send()
        .await
        .map_err(|err| ApiError::Transport(err.to_string()))?;

    if !response.is_success() {
        return Err(status_error(&response));
    }

    let list: ListUsersResponse = response.json().map_err(parse_error("ListUsersResponse"))?;
    Ok(list.users)
}

/// POST `/api/users`: create a user with a role the actor is permitted to
/// assign. Permission is not checked here; the server re-validates.
pub async fn create_user(
    api_base_url: &str,
    token: &str,
    request: &CreateUserRequest,
) -> ApiResult<CreateUserResponse> {
    let url = format!("{api_base_url}/api/users");

    let response = bearer(Client::post(&url), token)
        .json(request)
        .map_err(parse_error("CreateUserRequest"))?
        .send()
        .await
        .map_err(|err| ApiError::Transport(err.to_string()))?;

    if !response.is_success() {
        return Err(status_error(&response));
    }

    response.json().map_err(parse_error("CreateUserResponse"))
}

/// PUT `/api/users/{id}/modules`: replace a user's module grants.
pub async fn update_user_modules(
    api_base_url: &str,
    token: &str,
    user_id: &str,
    modules: &[ModuleGrant],
) -> ApiResult<UpdateModulesResponse> {
    let url = format!("{api_base_url}/api/users/{user_id}/modules");

    let body = UpdateModulesRequest {
        modules: modules.to_vec(),
    };

    let response = bearer(Client::put(&url), token)
        .json(&body)
        .map_err(parse_error("UpdateModulesRequest"))?
        .send()
        .await
        .map_err(|err| ApiError::Transport(err.to_string()))?;

    if !response.is_success() {
        return Err(status_error(&response));
    }

    response.json().map_err(parse_error("UpdateModulesResponse"))
}
