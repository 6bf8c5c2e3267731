use once_cell::sync::Lazy;
use regex::Regex;

static GROUP_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(/[A-Za-z0-9_-]+/scim/v2)/Groups/([A-Za-z0-9_-]+)").expect("group path pattern is valid")
});

/// Tenant scope and group id addressed by a resource path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupLocator {
    /// `/<tenant>/scim/v2` prefix shared by every resource of the tenant
    pub tenant_scope: String,
    pub group_id: String,
}

impl GroupLocator {
    /// Returns `None` when the path does not address a group
    pub fn parse(path: &str) -> Option<Self> {
        let captures = GROUP_PATH.captures(path)?;
        Some(Self {
            tenant_scope: captures.get(1)?.as_str().to_string(),
            group_id: captures.get(2)?.as_str().to_string(),
        })
    }

    pub fn users_path(&self) -> String {
        format!("{}/Users", self.tenant_scope)
    }

    /// Filter query asking whether `user_id` belongs to this group
    pub fn relationship_path(&self, user_id: &str) -> String {
        format!(
            "{}/Groups?filter=id eq \"{}\" and members eq \"{}\"",
            self.tenant_scope,
            self.group_id,
            filter_literal(user_id)
        )
    }
}

/// Escape a value for use inside a quoted SCIM filter string
fn filter_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '"' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
