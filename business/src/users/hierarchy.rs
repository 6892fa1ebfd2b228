//! Two-level hierarchy reconstruction.
//!
//! The API returns a flat list; display wants top-level accounts with their
//! direct sub-accounts attached. The hierarchy is exactly two levels deep: a
//! record with a parent reference is never itself a parent.

use std::collections::HashMap;

use ustr::Ustr;

use crate::users::UserAccount;

/// A top-level account with its direct sub-accounts.
#[derive(Debug, Clone, PartialEq)]
pub struct UserNode {
    pub account: UserAccount,
    pub sub_users: Vec<UserAccount>,
}

impl UserNode {
    pub fn has_sub_users(&self) -> bool {
        !self.sub_users.is_empty()
    }
}

/// Partition a flat user list into top-level accounts with attached
/// sub-accounts.
///
/// Single grouping pass over the input (O(P+C)), then one emit pass:
/// - top-level accounts keep their relative input order;
/// - each sub-list keeps the relative input order of its children;
/// - a child whose parent id matches no top-level account in the batch is
///   dropped from the output entirely. That mirrors the upstream behavior;
///   do not "fix" it here without a product decision.
pub fn organize_hierarchy(users: Vec<UserAccount>) -> Vec<UserNode> {
    let mut children: HashMap<Ustr, Vec<UserAccount>> = HashMap::new();
    let mut parents: Vec<UserAccount> = Vec::new();

    for user in users {
        match user.parent_account_id {
            Some(parent_id) => children.entry(parent_id).or_default().push(user),
            None => parents.push(user),
        }
    }

    parents
        .into_iter()
        .map(|account| {
            let sub_users = children.remove(&account.id).unwrap_or_default();
            UserNode { account, sub_users }
        })
        .collect()
}
