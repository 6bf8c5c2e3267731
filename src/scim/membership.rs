// Current group membership resolution

use async_trait::async_trait;
use futures::future::try_join_all;
use serde_json::{json, Value};

use crate::scim::error::ScimError;
use crate::scim::locator::GroupLocator;
use crate::scim::types::{MembershipReference, ScimUser};

/// Capability handed to the normalizer for looking up who is in a group today
///
/// `Ok(None)` means the locator does not address a group, so no delta can be
/// computed. Transport failures are errors and must not be folded into `None`.
#[async_trait]
pub trait FetchMembers: Send + Sync {
    async fn fetch_members(&self, locator: &str) -> Result<Option<Vec<MembershipReference>>, ScimError>;
}

/// Downstream directory queries the resolver fans out over
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    /// Every user of the tenant, in a single unpaginated call
    async fn list_users(&self, locator: &GroupLocator) -> Result<Vec<ScimUser>, ScimError>;

    /// Presence marker when `user_id` belongs to the group, `None` otherwise
    async fn group_relationship(&self, locator: &GroupLocator, user_id: &str) -> Result<Option<Value>, ScimError>;
}

/// Resolves membership by listing the directory and checking every user against the group
pub struct MembershipResolver<D> {
    directory: D,
}

impl<D: MemberDirectory> MembershipResolver<D> {
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    pub async fn resolve(&self, locator: &GroupLocator) -> Result<Vec<MembershipReference>, ScimError> {
        let users = self.directory.list_users(locator).await?;

        tracing::debug!(
            "Checking {} users for membership in group {}",
            users.len(),
            locator.group_id
        );

        // One relationship check per user; the first failure aborts the whole resolution
        let checks = users.iter().map(|user| async move {
            let group = self.directory.group_relationship(locator, &user.id).await?;
            Ok::<_, ScimError>(group.map(|group| MembershipReference {
                user_id: user.id.clone(),
                group,
            }))
        });

        let members: Vec<MembershipReference> = try_join_all(checks).await?.into_iter().flatten().collect();

        tracing::debug!("Group {} currently has {} members", locator.group_id, members.len());

        Ok(members)
    }
}

#[async_trait]
impl<D: MemberDirectory> FetchMembers for MembershipResolver<D> {
    async fn fetch_members(&self, locator: &str) -> Result<Option<Vec<MembershipReference>>, ScimError> {
        let Some(locator) = GroupLocator::parse(locator) else {
            tracing::debug!("Path {} does not address a group, skipping membership lookup", locator);
            return Ok(None);
        };

        self.resolve(&locator).await.map(Some)
    }
}

/// Fixed membership, used when no downstream is reachable (offline normalization, tests)
#[derive(Debug, Clone, Default)]
pub struct StaticMembers {
    members: Vec<String>,
}

impl StaticMembers {
    pub fn new<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            members: members.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl FetchMembers for StaticMembers {
    async fn fetch_members(&self, locator: &str) -> Result<Option<Vec<MembershipReference>>, ScimError> {
        let Some(locator) = GroupLocator::parse(locator) else {
            return Ok(None);
        };

        Ok(Some(
            self.members
                .iter()
                .map(|user_id| MembershipReference {
                    user_id: user_id.clone(),
                    group: json!({ "id": locator.group_id }),
                })
                .collect(),
        ))
    }
}
