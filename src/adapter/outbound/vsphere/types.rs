//! vSphere Automation API wire types.

use serde::{Deserialize, Serialize};

/// Managed object type of ESXi hosts in tag associations.
pub const HOST_OBJECT_TYPE: &str = "HostSystem";

#[derive(Debug, Deserialize)]
pub struct HostSummary {
    pub host: String,
    pub name: String,
    pub connection_state: String,
}

#[derive(Debug, Deserialize)]
pub struct HostSoftware {
    pub base_image: Option<BaseImage>,
}

#[derive(Debug, Deserialize)]
pub struct BaseImage {
    pub version: String,
}

#[derive(Debug, Deserialize)]
pub struct CategoryModel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub cardinality: String,
}

#[derive(Debug, Serialize)]
pub struct CategoryCreate<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub cardinality: &'static str,
    pub associable_types: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct TagModel {
    pub id: String,
    pub name: String,
    pub category_id: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct TagCreate<'a> {
    pub name: &'a str,
    pub category_id: &'a str,
    pub description: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ObjectId<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: &'a str,
}

impl<'a> ObjectId<'a> {
    pub fn host(id: &'a str) -> Self {
        Self {
            kind: HOST_OBJECT_TYPE,
            id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AssociationRequest<'a> {
    pub object_id: ObjectId<'a>,
}

/// Error body returned by the API on non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub messages: Vec<ErrorMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorMessage {
    pub default_message: String,
}

impl ErrorBody {
    /// Flatten into one line: `NOT_FOUND: message; message`.
    pub fn summary(&self) -> String {
        let messages = self
            .messages
            .iter()
            .map(|m| m.default_message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        match (&self.error_type, messages.is_empty()) {
            (Some(kind), true) => kind.clone(),
            (Some(kind), false) => format!("{kind}: {messages}"),
            (None, _) => messages,
        }
    }
}

/// Build number out of an image version such as `7.0.3-0.105.22348816`.
pub fn build_from_image_version(version: &str) -> Option<&str> {
    let build = version.rsplit(|c: char| c == '.' || c == '-').next()?;
    (!build.is_empty() && build.bytes().all(|b| b.is_ascii_digit())).then_some(build)
}
