//! State for the user directory view.
//!
//! The displayed list and the expanded-set are owned exclusively by this
//! state; nothing else mutates them. UI code stays dumb: it reads this state,
//! renders, and dispatches commands. Transitions live here so they are
//! testable without any rendering.

use std::any::Any;
use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use conship_states::State;
use ustr::Ustr;

use crate::notification::{Notification, NotificationKind};
use crate::users::{ModuleGrant, ModuleId, Role, UserAccount, UserNode};

/// Role selector for the directory filter bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoleFilter {
    #[default]
    All,
    Only(Role),
}

impl RoleFilter {
    pub fn matches(self, role: Role) -> bool {
        match self {
            RoleFilter::All => true,
            RoleFilter::Only(wanted) => role == wanted,
        }
    }
}

/// Aggregate counts shown above the list, computed over the full (unfiltered)
/// hierarchy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectoryStats {
    /// Top-level accounts plus all sub-accounts.
    pub total_users: usize,
    /// Top-level accounts with an organization role.
    pub organizations: usize,
    pub employees: usize,
    /// Active top-level accounts.
    pub active: usize,
}

/// Input state of the create-user modal.
///
/// The entered data survives a failed submit; only an explicit close or a
/// successful creation discards it.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateUserForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
    /// The roles the current actor may assign, in menu order.
    pub available_roles: Vec<Role>,
    pub in_flight: bool,
}

impl CreateUserForm {
    pub fn new(actor_role: Role) -> Self {
        let available_roles = actor_role.creatable_roles().to_vec();
        Self {
            name: String::new(),
            email: String::new(),
            password: String::new(),
            role: available_roles.first().copied(),
            available_roles,
            in_flight: false,
        }
    }

    /// Required-field presence is the only client-side validation.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.email.trim().is_empty()
            && !self.password.is_empty()
            && self.role.is_some()
    }
}

/// Input state of the edit-permissions modal.
#[derive(Debug, Clone, PartialEq)]
pub struct EditPermissionsForm {
    pub user_id: Ustr,
    pub user_name: String,
    pub user_email: String,
    pub selected: BTreeSet<ModuleId>,
    pub in_flight: bool,
}

impl EditPermissionsForm {
    /// Pre-populate the selection from the target user's current grants.
    pub fn for_user(user: &UserAccount) -> Self {
        Self {
            user_id: user.id,
            user_name: user.name.clone(),
            user_email: user.email.clone(),
            selected: user.modules.iter().map(|grant| grant.module_id).collect(),
            in_flight: false,
        }
    }

    pub fn toggle_module(&mut self, module: ModuleId) {
        if !self.selected.insert(module) {
            self.selected.remove(&module);
        }
    }

    /// Build the grant list submitted to the API: every selected module gets
    /// both read and write.
    pub fn grants(&self) -> Vec<ModuleGrant> {
        ModuleId::ALL
            .into_iter()
            .filter(|module| self.selected.contains(module))
            .map(ModuleGrant::full_access)
            .collect()
    }
}

/// State for the user directory view.
#[derive(Debug, Default)]
pub struct DirectoryState {
    users: Vec<UserNode>,
    /// True only during the initial list fetch; create/update block just
    /// their modal.
    loading: bool,
    initial_loaded: bool,
    expanded: HashSet<Ustr>,
    search: String,
    role_filter: RoleFilter,
    notification: Option<Notification>,
    create_form: Option<CreateUserForm>,
    edit_form: Option<EditPermissionsForm>,
}

impl State for DirectoryState {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl DirectoryState {
    pub fn new() -> Self {
        Self::default()
    }

    // === list/refresh ===

    /// A fetch went in flight. The spinner shows only before the first list
    /// has ever loaded.
    pub fn begin_fetch(&mut self) {
        if !self.initial_loaded {
            self.loading = true;
        }
    }

    /// Replace displayed state with a freshly organized hierarchy.
    pub fn apply_users(&mut self, organized: Vec<UserNode>) {
        self.users = organized;
        self.loading = false;
        self.initial_loaded = true;
    }

    /// A fetch failed: previous list stays intact, loading clears, a
    /// transient error surfaces.
    pub fn fetch_failed(&mut self, message: impl Into<String>, now: DateTime<Utc>) {
        self.loading = false;
        self.notify(NotificationKind::Error, message, now);
    }

    pub fn users(&self) -> &[UserNode] {
        &self.users
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    // === filter ===

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    pub fn set_role_filter(&mut self, filter: RoleFilter) {
        self.role_filter = filter;
    }

    fn matches_filters(&self, node: &UserNode) -> bool {
        let term = self.search.to_lowercase();
        let matches_search = term.is_empty()
            || node.account.name.to_lowercase().contains(&term)
            || node.account.email.to_lowercase().contains(&term);
        matches_search && self.role_filter.matches(node.account.role)
    }

    /// Top-level accounts passing the search term and role selector.
    /// Filtering hides, it never reorders.
    pub fn visible_users(&self) -> Vec<&UserNode> {
        self.users
            .iter()
            .filter(|node| self.matches_filters(node))
            .collect()
    }

    // === expand/collapse ===

    pub fn toggle_expanded(&mut self, id: Ustr) {
        if !self.expanded.insert(id) {
            self.expanded.remove(&id);
        }
    }

    pub fn is_expanded(&self, id: Ustr) -> bool {
        self.expanded.contains(&id)
    }

    // === notifications ===

    pub fn notify(
        &mut self,
        kind: NotificationKind,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) {
        self.notification = Some(match kind {
            NotificationKind::Success => Notification::success(message, now),
            NotificationKind::Error => Notification::error(message, now),
        });
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    /// Drop the notification once its display window has passed.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        if self
            .notification
            .as_ref()
            .is_some_and(|notification| notification.is_expired(now))
        {
            self.notification = None;
        }
    }

    // === modal forms ===

    /// Open the create-user modal. For actors whose role map is empty the
    /// action is hidden; this returns false and opens nothing.
    pub fn open_create_form(&mut self, actor_role: Role) -> bool {
        if !actor_role.can_create_users() {
            return false;
        }
        self.create_form = Some(CreateUserForm::new(actor_role));
        true
    }

    pub fn close_create_form(&mut self) {
        self.create_form = None;
    }

    pub fn create_form(&self) -> Option<&CreateUserForm> {
        self.create_form.as_ref()
    }

    pub fn create_form_mut(&mut self) -> Option<&mut CreateUserForm> {
        self.create_form.as_mut()
    }

    pub fn open_edit_form(&mut self, user: &UserAccount) {
        self.edit_form = Some(EditPermissionsForm::for_user(user));
    }

    pub fn close_edit_form(&mut self) {
        self.edit_form = None;
    }

    pub fn edit_form(&self) -> Option<&EditPermissionsForm> {
        self.edit_form.as_ref()
    }

    pub fn edit_form_mut(&mut self) -> Option<&mut EditPermissionsForm> {
        self.edit_form.as_mut()
    }

    // === stats ===

    pub fn stats(&self) -> DirectoryStats {
        let mut stats = DirectoryStats::default();
        for node in &self.users {
            stats.total_users += 1 + node.sub_users.len();
            if node.account.role.is_organization() {
                stats.organizations += 1;
            }
            if node.account.role == Role::ConshipEmployee {
                stats.employees += 1;
            }
            if node.account.active {
                stats.active += 1;
            }
        }
        stats
    }
}
