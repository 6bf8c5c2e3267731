// Wire types shared by the normalizer, the resolver and the transport

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Schema URI the downstream dialect requires on every PATCH document
pub const PATCH_OP_SCHEMA: &str = "urn:ietf:params:scim:api:messages:2.0:PatchOp";

/// Attribute carrying group membership
pub const MEMBERS_ATTRIBUTE: &str = "members";

/// Attributes stripped from a resource before it is decomposed into operations
pub const RESERVED_ATTRIBUTES: [&str; 2] = ["id", "schemas"];

/// Opaque header bag carried from the inbound request to the downstream one
pub type HeaderBag = BTreeMap<String, String>;

/// HTTP methods the bridge forwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScimMethod {
    Get,    // read
    Post,   // create
    Patch,  // composite replace
    Put,    // full replace
    Delete,
}

impl ScimMethod {
    /// Every method the bridge accepts, in the order advertised by the allow header
    pub const ALLOWED: [ScimMethod; 5] = [
        ScimMethod::Get,
        ScimMethod::Post,
        ScimMethod::Patch,
        ScimMethod::Put,
        ScimMethod::Delete,
    ];

    /// Parse an HTTP method name, case-insensitively
    pub fn from_http(method: &str) -> Option<Self> {
        match method.to_ascii_lowercase().as_str() {
            "get" => Some(ScimMethod::Get),
            "post" => Some(ScimMethod::Post),
            "patch" => Some(ScimMethod::Patch),
            "put" => Some(ScimMethod::Put),
            "delete" => Some(ScimMethod::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScimMethod::Get => "get",
            ScimMethod::Post => "post",
            ScimMethod::Patch => "patch",
            ScimMethod::Put => "put",
            ScimMethod::Delete => "delete",
        }
    }

    /// Value for the `allow` header sent with a 405
    pub fn allow_header() -> String {
        Self::ALLOWED
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl std::fmt::Display for ScimMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inbound request as handed to the normalizer
#[derive(Debug, Clone)]
pub struct MutationRequest {
    pub method: ScimMethod,
    pub headers: HeaderBag,
    pub path: String,
    pub body: Option<Value>,
}

impl MutationRequest {
    pub fn new(method: ScimMethod, headers: HeaderBag, path: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            method,
            headers,
            path: path.into(),
            body,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Add,
    Replace,
    Remove,
}

impl OpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpKind::Add => "add",
            OpKind::Replace => "replace",
            OpKind::Remove => "remove",
        }
    }
}

/// One `{ "value": id }` entry of a membership list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberReference {
    pub value: String,
}

impl MemberReference {
    pub fn new(id: impl Into<String>) -> Self {
        Self { value: id.into() }
    }
}

/// Value of an atomic operation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OperationValue {
    Scalar(Value),
    Object(Map<String, Value>),
    Members(Vec<MemberReference>),
    Absent,
}

impl OperationValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, OperationValue::Absent)
    }

    /// An absent value or an empty array carries no effect downstream
    pub fn has_effect(&self) -> bool {
        match self {
            OperationValue::Absent => false,
            OperationValue::Members(members) => !members.is_empty(),
            OperationValue::Scalar(Value::Array(items)) => !items.is_empty(),
            OperationValue::Scalar(_) | OperationValue::Object(_) => true,
        }
    }
}

impl From<Value> for OperationValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => OperationValue::Object(map),
            other => OperationValue::Scalar(other),
        }
    }
}

/// The unit the downstream dialect accepts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtomicOperation {
    pub op: OpKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "OperationValue::is_absent")]
    pub value: OperationValue,
}

impl AtomicOperation {
    pub fn replace(path: impl Into<String>, value: impl Into<OperationValue>) -> Self {
        Self {
            op: OpKind::Replace,
            path: Some(path.into()),
            value: value.into(),
        }
    }

    pub fn add_members(members: Vec<MemberReference>) -> Self {
        Self {
            op: OpKind::Add,
            path: Some(MEMBERS_ATTRIBUTE.to_string()),
            value: OperationValue::Members(members),
        }
    }

    pub fn remove_members(members: Vec<MemberReference>) -> Self {
        Self {
            op: OpKind::Remove,
            path: Some(MEMBERS_ATTRIBUTE.to_string()),
            value: OperationValue::Members(members),
        }
    }

    pub fn has_effect(&self) -> bool {
        self.value.has_effect()
    }
}

/// Downstream-compliant PATCH document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchDocument {
    /// Envelope fields of the inbound body other than `schemas` and `Operations`
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub schemas: Vec<String>,
    #[serde(rename = "Operations")]
    pub operations: Vec<AtomicOperation>,
}

impl PatchDocument {
    pub fn new(operations: Vec<AtomicOperation>) -> Self {
        Self::with_envelope(Map::new(), operations)
    }

    pub fn with_envelope(extra: Map<String, Value>, operations: Vec<AtomicOperation>) -> Self {
        let extra = extra
            .into_iter()
            .filter(|(key, _)| key != "schemas" && key != "Operations")
            .collect();
        Self {
            extra,
            schemas: vec![PATCH_OP_SCHEMA.to_string()],
            operations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NormalizedBody {
    Patch(PatchDocument),
    Passthrough(Value),
}

/// Output of the normalizer, ready for the downstream client
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRequest {
    pub method: ScimMethod,
    pub headers: HeaderBag,
    pub path: String,
    pub data: Option<NormalizedBody>,
}

impl NormalizedRequest {
    /// Body as JSON, ready to be written on the wire
    pub fn data_value(&self) -> Result<Option<Value>, serde_json::Error> {
        self.data.as_ref().map(serde_json::to_value).transpose()
    }

    pub fn operations(&self) -> &[AtomicOperation] {
        match &self.data {
            Some(NormalizedBody::Patch(doc)) => &doc.operations,
            _ => &[],
        }
    }
}

/// A user found to belong to a group while resolving current membership
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipReference {
    pub user_id: String,
    pub group: Value,
}

/// Subset of a SCIM user resource the resolver reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScimUser {
    pub id: String,
}

/// SCIM list response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    #[serde(rename = "Resources", default = "Vec::new")]
    pub resources: Vec<T>,
}
