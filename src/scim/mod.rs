// SCIM dialect transformation core: membership resolution, delta computation
// and decomposition of PUT / composite PATCH bodies into atomic operations

pub mod types;
pub mod error;
pub mod locator;
pub mod membership;
pub mod delta;
pub mod operations;
pub mod normalize;

// Re-export core types
pub use types::*;
pub use error::ScimError;
pub use locator::GroupLocator;
pub use membership::{FetchMembers, MemberDirectory, MembershipResolver, StaticMembers};
pub use delta::{compute_delta, MembershipDelta};
pub use operations::{BuiltOperation, OperationBuilder};
pub use normalize::normalize;
