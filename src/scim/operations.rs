// Attribute-level decomposition into atomic operations

use futures::future::try_join_all;
use serde_json::Value;

use crate::scim::delta::compute_delta;
use crate::scim::error::ScimError;
use crate::scim::membership::FetchMembers;
use crate::scim::types::{AtomicOperation, MEMBERS_ATTRIBUTE};

/// Result of decomposing one attribute
#[derive(Debug, Clone, PartialEq)]
pub enum BuiltOperation {
    Single(AtomicOperation),
    Multiple(Vec<AtomicOperation>),
}

impl BuiltOperation {
    pub fn into_vec(self) -> Vec<AtomicOperation> {
        match self {
            BuiltOperation::Single(op) => vec![op],
            BuiltOperation::Multiple(ops) => ops,
        }
    }
}

/// Decomposes attributes of the resource addressed by `locator`
pub struct OperationBuilder<'a, F: ?Sized> {
    fetch: &'a F,
    locator: &'a str,
}

impl<'a, F: FetchMembers + ?Sized> OperationBuilder<'a, F> {
    pub fn new(fetch: &'a F, locator: &'a str) -> Self {
        Self { fetch, locator }
    }

    /// Turn one attribute into its operations
    ///
    /// `members` becomes an add/remove pair against the group's current membership,
    /// or nothing at all when that membership cannot be resolved. Every other key is
    /// a plain `replace`; empty values are filtered later by [`Self::build_all`].
    pub async fn build(&self, key: &str, value: &Value) -> Result<BuiltOperation, ScimError> {
        if key != MEMBERS_ATTRIBUTE {
            return Ok(BuiltOperation::Single(AtomicOperation::replace(key, value.clone())));
        }

        let desired = member_ids(value)?;
        let current = self.fetch.fetch_members(self.locator).await?;

        match compute_delta(&desired, current.as_deref()) {
            Some(ops) => Ok(BuiltOperation::Multiple(ops.into())),
            None => {
                tracing::debug!("No membership resolvable for {}, dropping members replacement", self.locator);
                Ok(BuiltOperation::Multiple(Vec::new()))
            }
        }
    }

    /// Build every entry concurrently, then flatten in input order and drop no-op operations
    pub async fn build_all<'e, I>(&self, entries: I) -> Result<Vec<AtomicOperation>, ScimError>
    where
        I: IntoIterator<Item = (&'e str, &'e Value)>,
    {
        let built = try_join_all(entries.into_iter().map(|(key, value)| self.build(key, value))).await?;

        Ok(built
            .into_iter()
            .flat_map(BuiltOperation::into_vec)
            .filter(AtomicOperation::has_effect)
            .collect())
    }
}

/// Member ids out of a `[{ "value": id }]` list; numeric ids are accepted as strings
fn member_ids(value: &Value) -> Result<Vec<String>, ScimError> {
    let entries = value
        .as_array()
        .ok_or_else(|| ScimError::invalid_body("members must be an array of { value } references"))?;

    entries
        .iter()
        .map(|entry| match entry.get("value") {
            Some(Value::String(id)) => Ok(id.clone()),
            Some(Value::Number(id)) => Ok(id.to_string()),
            _ => Err(ScimError::invalid_body(format!("member reference without a usable value: {}", entry))),
        })
        .collect()
}
