//! MISP object templates and construction of the enrichment objects

use crate::types::{Attribute, MispObject, ScanResult};
use serde_json::Map;
use uuid::Uuid;

/// Relationship from the file object to its report
pub const ANALYSED_WITH: &str = "analysed-with";

/// Comment carried by the file -> report reference
pub const REFERENCE_COMMENT: &str = "Expanded with virustotal data";

/// Attribute slot of an object template
pub struct TemplateAttribute {
    pub relation: &'static str,
    pub attr_type: &'static str,
    pub category: &'static str,
    pub to_ids: bool,
}

/// Static description of a MISP object template
pub struct ObjectTemplate {
    pub name: &'static str,
    pub meta_category: &'static str,
    pub uuid: &'static str,
    pub version: &'static str,
    pub attributes: &'static [TemplateAttribute],
}

pub const VIRUSTOTAL_REPORT: ObjectTemplate = ObjectTemplate {
    name: "virustotal-report",
    meta_category: "misc",
    uuid: "d7dd0154-e04f-4c34-a2fb-79f3a3a52aa4",
    version: "4",
    attributes: &[
        TemplateAttribute {
            relation: "permalink",
            attr_type: "link",
            category: "External analysis",
            to_ids: false,
        },
        TemplateAttribute {
            relation: "detection-ratio",
            attr_type: "text",
            category: "External analysis",
            to_ids: false,
        },
        TemplateAttribute {
            relation: "last-submission",
            attr_type: "datetime",
            category: "Other",
            to_ids: false,
        },
    ],
};

pub const FILE: ObjectTemplate = ObjectTemplate {
    name: "file",
    meta_category: "file",
    uuid: "688c46fb-5edb-40a3-8273-1af7923e2215",
    version: "24",
    attributes: &[
        TemplateAttribute {
            relation: "md5",
            attr_type: "md5",
            category: "Payload delivery",
            to_ids: true,
        },
        TemplateAttribute {
            relation: "sha1",
            attr_type: "sha1",
            category: "Payload delivery",
            to_ids: true,
        },
        TemplateAttribute {
            relation: "sha256",
            attr_type: "sha256",
            category: "Payload delivery",
            to_ids: true,
        },
    ],
};

impl ObjectTemplate {
    /// Create an empty object from this template with a fresh UUID
    pub fn instantiate(&self, comment: &str) -> MispObject {
        MispObject {
            name: self.name.to_string(),
            uuid: Uuid::new_v4().to_string(),
            meta_category: self.meta_category.to_string(),
            template_uuid: Some(self.uuid.to_string()),
            template_version: Some(self.version.to_string()),
            comment: comment.to_string(),
            attributes: Vec::new(),
            references: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Build an attribute for `relation`, or `None` if the template has no such slot
    pub fn attribute(&self, relation: &str, value: &str) -> Option<Attribute> {
        let slot = self.attributes.iter().find(|a| a.relation == relation)?;
        Some(Attribute {
            uuid: Some(Uuid::new_v4().to_string()),
            object_relation: Some(slot.relation.to_string()),
            attr_type: slot.attr_type.to_string(),
            category: slot.category.to_string(),
            to_ids: slot.to_ids,
            value: value.to_string(),
            extra: Map::new(),
        })
    }
}

/// Objects derived from one scan report
pub struct EnrichmentObjects {
    pub report: MispObject,
    pub file: MispObject,
}

fn fill(template: &ObjectTemplate, object: &mut MispObject, values: &[(&str, &str)]) {
    object.attributes.extend(
        values
            .iter()
            .filter_map(|(relation, value)| template.attribute(relation, value)),
    );
}

/// Build the report object and the file object pointing at it
pub fn build_objects(scan: &ScanResult) -> EnrichmentObjects {
    let mut report = VIRUSTOTAL_REPORT.instantiate(&format!("File {}", scan.md5));
    fill(
        &VIRUSTOTAL_REPORT,
        &mut report,
        &[
            ("permalink", scan.permalink.as_str()),
            ("detection-ratio", scan.detection_ratio().as_str()),
            ("last-submission", scan.scan_date.as_str()),
        ],
    );

    let mut file = FILE.instantiate("");
    fill(
        &FILE,
        &mut file,
        &[
            ("md5", scan.md5.as_str()),
            ("sha1", scan.sha1.as_str()),
            ("sha256", scan.sha256.as_str()),
        ],
    );
    file.add_reference(&report.uuid, ANALYSED_WITH, REFERENCE_COMMENT);

    EnrichmentObjects { report, file }
}
