//! Core type definitions: scan results and the MISP event model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// File report returned by the reputation service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Number of engines flagging the file
    pub positives: u32,
    /// Total number of engines that scanned the file
    pub total: u32,
    /// Link to the report on the reputation service
    pub permalink: String,
    /// Date of the last scan, as reported upstream
    pub scan_date: String,
    pub md5: String,
    pub sha1: String,
    pub sha256: String,
}

impl ScanResult {
    /// Detection ratio in the `positives/total` form
    pub fn detection_ratio(&self) -> String {
        format!("{}/{}", self.positives, self.total)
    }

    /// Check if any engine flagged the file
    pub fn is_detected(&self) -> bool {
        self.positives > 0
    }
}

/// A MISP event as returned by `events/view`.
///
/// Only the members the enrichment touches are modelled. Everything else is
/// kept in `extra` so that pushing the event back does not drop data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub uuid: String,
    #[serde(default)]
    pub info: String,
    #[serde(rename = "Object", default)]
    pub objects: Vec<MispObject>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Event {
    /// Check if any object attribute carries exactly this value
    pub fn contains_attribute_value(&self, value: &str) -> bool {
        self.attribute_values().any(|v| v == value)
    }

    /// Like [`Event::contains_attribute_value`], ignoring ASCII case
    pub fn contains_attribute_value_ignore_case(&self, value: &str) -> bool {
        self.attribute_values().any(|v| v.eq_ignore_ascii_case(value))
    }

    fn attribute_values(&self) -> impl Iterator<Item = &str> {
        self.objects
            .iter()
            .flat_map(|o| o.attributes.iter())
            .map(|a| a.value.as_str())
    }

    /// Append an object and return its UUID
    pub fn add_object(&mut self, object: MispObject) -> String {
        let uuid = object.uuid.clone();
        self.objects.push(object);
        uuid
    }

    /// Look up an object by UUID
    pub fn object(&self, uuid: &str) -> Option<&MispObject> {
        self.objects.iter().find(|o| o.uuid == uuid)
    }
}

/// A structured record inside an event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MispObject {
    pub name: String,
    pub uuid: String,
    #[serde(rename = "meta-category", default)]
    pub meta_category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_version: Option<String>,
    #[serde(default)]
    pub comment: String,
    #[serde(rename = "Attribute", default)]
    pub attributes: Vec<Attribute>,
    #[serde(rename = "ObjectReference", default)]
    pub references: Vec<ObjectReference>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MispObject {
    /// Get the value stored under an object relation
    pub fn attribute(&self, relation: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.object_relation.as_deref() == Some(relation))
            .map(|a| a.value.as_str())
    }

    /// Add an outbound reference to another object in the same event
    pub fn add_reference(&mut self, referenced_uuid: &str, relationship_type: &str, comment: &str) {
        self.references.push(ObjectReference {
            uuid: Uuid::new_v4().to_string(),
            object_uuid: self.uuid.clone(),
            referenced_uuid: referenced_uuid.to_string(),
            relationship_type: relationship_type.to_string(),
            comment: comment.to_string(),
            extra: Map::new(),
        });
    }
}

/// A single value inside an object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_relation: Option<String>,
    #[serde(rename = "type", default)]
    pub attr_type: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub to_ids: bool,
    #[serde(default)]
    pub value: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Directional link between two objects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectReference {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub object_uuid: String,
    pub referenced_uuid: String,
    pub relationship_type: String,
    #[serde(default)]
    pub comment: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
