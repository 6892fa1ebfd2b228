//! Domain and wire types for the managed-users API.
//!
//! Field names mirror the backend's JSON exactly (`_id`, `parentAccountId`,
//! `moduleId`); the closed enums here are the contract: neither roles nor
//! modules are user-extensible.

use serde::{Deserialize, Serialize};
use ustr::Ustr;

/// Fixed role enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SystemAdmin,
    ConshipEmployee,
    Customer,
    ForeignPartner,
    CustomerUser,
    ForeignPartnerUser,
}

impl Role {
    /// The static role-creation map: which roles this actor may assign when
    /// creating a user. Empty means the create action is hidden entirely.
    ///
    /// This is a UI gate only; the command layer does not re-validate, the
    /// server does.
    pub fn creatable_roles(self) -> &'static [Role] {
        match self {
            Role::SystemAdmin => &[Role::ConshipEmployee, Role::Customer, Role::ForeignPartner],
            Role::Customer => &[Role::CustomerUser],
            Role::ForeignPartner => &[Role::ForeignPartnerUser],
            Role::ConshipEmployee | Role::CustomerUser | Role::ForeignPartnerUser => &[],
        }
    }

    pub fn can_create_users(self) -> bool {
        !self.creatable_roles().is_empty()
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Role::SystemAdmin => "System Admin",
            Role::ConshipEmployee => "Conship Employee",
            Role::Customer => "Customer",
            Role::ForeignPartner => "Foreign Partner",
            Role::CustomerUser => "Customer User",
            Role::ForeignPartnerUser => "Foreign Partner User",
        }
    }

    /// Roles that represent an organization owning sub-accounts.
    pub fn is_organization(self) -> bool {
        matches!(self, Role::Customer | Role::ForeignPartner)
    }
}

/// Fixed module enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleId {
    Quotes,
    Tracking,
    Analytics,
    Users,
    Partners,
    Settings,
}

impl ModuleId {
    pub const ALL: [ModuleId; 6] = [
        ModuleId::Quotes,
        ModuleId::Tracking,
        ModuleId::Analytics,
        ModuleId::Users,
        ModuleId::Partners,
        ModuleId::Settings,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            ModuleId::Quotes => "Quotes",
            ModuleId::Tracking => "Tracking",
            ModuleId::Analytics => "Analytics",
            ModuleId::Users => "User Management",
            ModuleId::Partners => "Partners",
            ModuleId::Settings => "Settings",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
}

/// A user's access to one functional area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleGrant {
    pub module_id: ModuleId,
    pub name: String,
    pub permissions: Vec<Permission>,
}

impl ModuleGrant {
    /// The only grant shape the permissions form produces: a selected module
    /// always carries both read and write. There is deliberately no
    /// read-only path pending a product decision.
    pub fn full_access(module_id: ModuleId) -> Self {
        Self {
            module_id,
            name: module_id.display_name().to_string(),
            permissions: vec![Permission::Read, Permission::Write],
        }
    }
}

/// A user record as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    #[serde(rename = "_id")]
    pub id: Ustr,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub active: bool,
    /// Absent or null means this is a top-level account.
    #[serde(default)]
    pub parent_account_id: Option<Ustr>,
    #[serde(default)]
    pub modules: Vec<ModuleGrant>,
}

impl UserAccount {
    pub fn is_top_level(&self) -> bool {
        self.parent_account_id.is_none()
    }
}

// === wire shapes ===

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListUsersResponse {
    pub users: Vec<UserAccount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateUserResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateModulesRequest {
    pub modules: Vec<ModuleGrant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateModulesResponse {
    pub success: bool,
}

/// Error body some endpoints return on non-success statuses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_creation_map_matches_contract() {
        assert_eq!(
            Role::SystemAdmin.creatable_roles(),
            &[Role::ConshipEmployee, Role::Customer, Role::ForeignPartner]
        );
        assert_eq!(Role::Customer.creatable_roles(), &[Role::CustomerUser]);
        assert_eq!(
            Role::ForeignPartner.creatable_roles(),
            &[Role::ForeignPartnerUser]
        );
        assert!(Role::ConshipEmployee.creatable_roles().is_empty());
        assert!(Role::CustomerUser.creatable_roles().is_empty());
        assert!(Role::ForeignPartnerUser.creatable_roles().is_empty());
    }

    #[test]
    fn customer_may_not_create_system_admin() {
        assert!(!Role::Customer.creatable_roles().contains(&Role::SystemAdmin));
    }

    #[test]
    fn user_account_deserializes_wire_names() {
        let account: UserAccount = serde_json::from_str(
            r#"{
                "_id": "u-2",
                "name": "Bob",
                "email": "bob@acme.example",
                "role": "customer_user",
                "active": true,
                "parentAccountId": "u-1",
                "modules": [
                    {"moduleId": "quotes", "name": "Quotes", "permissions": ["read", "write"]}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(account.id, Ustr::from("u-2"));
        assert_eq!(account.role, Role::CustomerUser);
        assert_eq!(account.parent_account_id, Some(Ustr::from("u-1")));
        assert!(!account.is_top_level());
        assert_eq!(account.modules[0].module_id, ModuleId::Quotes);
        assert_eq!(
            account.modules[0].permissions,
            vec![Permission::Read, Permission::Write]
        );
    }

    #[test]
    fn null_parent_means_top_level() {
        let account: UserAccount = serde_json::from_str(
            r#"{"_id":"u-1","name":"Acme","email":"ops@acme.example","role":"customer","active":true,"parentAccountId":null}"#,
        )
        .unwrap();
        assert!(account.is_top_level());
        assert!(account.modules.is_empty());
    }

    #[test]
    fn full_access_grant_has_read_and_write() {
        let grant = ModuleGrant::full_access(ModuleId::Tracking);
        assert_eq!(grant.name, "Tracking");
        assert_eq!(grant.permissions, vec![Permission::Read, Permission::Write]);
    }
}
