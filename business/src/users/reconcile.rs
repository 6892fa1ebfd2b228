//! The single reconciliation step between command caches and the directory.
//!
//! Runs on the event loop after [`conship_states::StateCtx::apply_pending`].
//! Each cache is consumed at most once per call (taken back to `Idle`), so a
//! result is applied exactly once. All transitions here run to completion
//! before the next message or frame; there is no reentrancy.

use chrono::{DateTime, Utc};
use conship_states::StateCtx;

use crate::notification::NotificationKind;
use crate::users::commands::{
    CreateUserCache, RequestPhase, UpdateModulesCache, UsersFetchCache,
};
use crate::users::hierarchy::organize_hierarchy;
use crate::users::state::DirectoryState;

const FETCH_ERROR_TEXT: &str = "Failed to fetch users";
const CREATE_ERROR_TEXT: &str = "Failed to create user";
const CREATE_SUCCESS_TEXT: &str = "User created successfully";
const UPDATE_ERROR_TEXT: &str = "Failed to update permissions";
const UPDATE_SUCCESS_TEXT: &str = "User permissions updated";

/// Fold the three request caches into [`DirectoryState`] and expire the
/// notification.
///
/// Returns true when a mutation succeeded and the caller should dispatch
/// [`crate::users::commands::FetchManagedUsersCommand`] for the follow-up
/// refresh. Dispatching is left to the caller so this function stays free of
/// the runtime.
#[must_use]
pub fn reconcile_directory(ctx: &mut StateCtx, now: DateTime<Utc>) -> bool {
    let fetch = std::mem::take(&mut ctx.state_mut::<UsersFetchCache>().phase);
    let create = std::mem::take(&mut ctx.state_mut::<CreateUserCache>().phase);
    let update = std::mem::take(&mut ctx.state_mut::<UpdateModulesCache>().phase);

    let directory = ctx.state_mut::<DirectoryState>();
    let mut needs_refresh = false;

    match fetch {
        RequestPhase::Idle => {}
        RequestPhase::Pending => directory.begin_fetch(),
        RequestPhase::Success(flat) => directory.apply_users(organize_hierarchy(flat)),
        RequestPhase::Error(_) => directory.fetch_failed(FETCH_ERROR_TEXT, now),
    }

    match create {
        RequestPhase::Idle => {}
        RequestPhase::Pending => {
            if let Some(form) = directory.create_form_mut() {
                form.in_flight = true;
            }
        }
        RequestPhase::Success(response) if response.success => {
            directory.close_create_form();
            directory.notify(NotificationKind::Success, CREATE_SUCCESS_TEXT, now);
            needs_refresh = true;
        }
        // 2xx with `success: false` is still a failure; surface the server's
        // message and keep the form open with its data intact.
        RequestPhase::Success(response) => {
            let message = response
                .error
                .unwrap_or_else(|| CREATE_ERROR_TEXT.to_string());
            directory.notify(NotificationKind::Error, message, now);
            if let Some(form) = directory.create_form_mut() {
                form.in_flight = false;
            }
        }
        RequestPhase::Error(err) => {
            let message = err
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| CREATE_ERROR_TEXT.to_string());
            directory.notify(NotificationKind::Error, message, now);
            if let Some(form) = directory.create_form_mut() {
                form.in_flight = false;
            }
        }
    }

    match update {
        RequestPhase::Idle => {}
        RequestPhase::Pending => {
            if let Some(form) = directory.edit_form_mut() {
                form.in_flight = true;
            }
        }
        RequestPhase::Success(response) if response.success => {
            directory.close_edit_form();
            directory.notify(NotificationKind::Success, UPDATE_SUCCESS_TEXT, now);
            needs_refresh = true;
        }
        // Update failures get the generic text only; the form stays open for
        // a retry.
        RequestPhase::Success(_) | RequestPhase::Error(_) => {
            directory.notify(NotificationKind::Error, UPDATE_ERROR_TEXT, now);
            if let Some(form) = directory.edit_form_mut() {
                form.in_flight = false;
            }
        }
    }

    directory.tick(now);
    needs_refresh
}
