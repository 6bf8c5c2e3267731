use std::collections::HashSet;

use crate::scim::types::{AtomicOperation, MemberReference, MembershipReference};

/// Minimal set of member changes turning the current group into the desired one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipDelta {
    /// Desired ids not yet in the group, in desired order
    pub additions: Vec<String>,
    /// Current ids no longer desired, in current order
    pub removals: Vec<String>,
}

impl MembershipDelta {
    pub fn between(desired: &[String], current: &[MembershipReference]) -> Self {
        let current_ids: HashSet<&str> = current.iter().map(|m| m.user_id.as_str()).collect();
        let desired_ids: HashSet<&str> = desired.iter().map(String::as_str).collect();

        let additions = desired
            .iter()
            .filter(|id| !current_ids.contains(id.as_str()))
            .cloned()
            .collect();

        let removals = current
            .iter()
            .filter(|m| !desired_ids.contains(m.user_id.as_str()))
            .map(|m| m.user_id.clone())
            .collect();

        Self { additions, removals }
    }

    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }

    /// Always `[add, remove]`, even when a side is empty
    pub fn into_operations(self) -> [AtomicOperation; 2] {
        [
            AtomicOperation::add_members(self.additions.into_iter().map(MemberReference::new).collect()),
            AtomicOperation::remove_members(self.removals.into_iter().map(MemberReference::new).collect()),
        ]
    }
}

/// Add/remove pair for a membership replacement, or `None` when the current members are unknown
pub fn compute_delta(desired: &[String], current: Option<&[MembershipReference]>) -> Option<[AtomicOperation; 2]> {
    current.map(|current| MembershipDelta::between(desired, current).into_operations())
}
