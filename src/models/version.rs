//! Version documents: one release of a dataset edition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DatasetType, State};
use crate::error::Result;
use crate::utils::etag;

/// A hyperlink to another catalog resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkObject {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub href: String,
}

impl LinkObject {
    pub fn new(id: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            href: href.into(),
        }
    }
}

/// Links carried by a version document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<LinkObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<LinkObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edition: Option<LinkObject>,
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<LinkObject>,
    /// The only sub-link a caller may set through an update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spatial: Option<LinkObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<LinkObject>,
}

/// A single downloadable artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadObject {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub href: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub size: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub public: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub private: String,
}

/// Per-format downloads of a version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadList {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv: Option<DownloadObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csvw: Option<DownloadObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xls: Option<DownloadObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xlsx: Option<DownloadObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txt: Option<DownloadObject>,
}

impl DownloadList {
    /// Formats paired with their field names, in a stable order.
    pub fn formats(&self) -> [(&'static str, Option<&DownloadObject>); 5] {
        [
            ("csv", self.csv.as_ref()),
            ("csvw", self.csvw.as_ref()),
            ("xls", self.xls.as_ref()),
            ("xlsx", self.xlsx.as_ref()),
            ("txt", self.txt.as_ref()),
        ]
    }

    /// Fill every format missing here from `fallback`.
    pub fn fill_missing_from(&mut self, fallback: &DownloadList) {
        fn fill(slot: &mut Option<DownloadObject>, other: &Option<DownloadObject>) {
            if slot.is_none() {
                slot.clone_from(other);
            }
        }
        fill(&mut self.csv, &fallback.csv);
        fill(&mut self.csvw, &fallback.csvw);
        fill(&mut self.xls, &fallback.xls);
        fill(&mut self.xlsx, &fallback.xlsx);
        fill(&mut self.txt, &fallback.txt);
    }

    /// Whether the CSV artifact has already been made public.
    pub fn has_public_csv(&self) -> bool {
        self.csv.as_ref().is_some_and(|csv| !csv.public.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub alert_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestChange {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub change_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalFrequency {
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub frequency: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageNote {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub note: String,
}

/// One release of a dataset edition.
///
/// Doubles as the partial update body: every field is optional on the wire
/// and empty values mean "keep what is stored" (see [`crate::workflow::merge`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Version {
    /// Instance ID backing this version.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dataset_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub edition: String,
    #[serde(default)]
    pub version: u32,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub dataset_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<State>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub collection_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub release_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal: Option<Vec<TemporalFrequency>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alerts: Option<Vec<Alert>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_changes: Option<Vec<LatestChange>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_notes: Option<Vec<UsageNote>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloads: Option<DownloadList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<VersionLinks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub e_tag: String,
}

impl Version {
    /// Content hash of this document, ignoring its own stored ETag.
    pub fn hash(&self) -> Result<String> {
        let mut unsigned = self.clone();
        unsigned.e_tag.clear();
        etag::content_hash(&unsigned)
    }

    /// Parsed dataset type, `InvalidDatasetType` when unrecognised.
    pub fn resolved_type(&self) -> Result<DatasetType> {
        DatasetType::resolve(&self.dataset_type)
    }

    /// Link to this version, if one is set.
    pub fn version_link(&self) -> Option<&LinkObject> {
        self.links.as_ref().and_then(|links| links.version.as_ref())
    }
}
