//! Dataset documents with their published (Current) and in-edit (Next) halves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{LinkObject, State, Version};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editions: Option<LinkObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<LinkObject>,
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<LinkObject>,
}

/// One side of a dataset document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub dataset_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<State>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub collection_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub next_release: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<DatasetLinks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Dataset {
    /// Record the version an editorial collection is now working on.
    pub fn associate(&mut self, state: State, version: &Version) {
        self.state = Some(state);
        self.collection_id.clone_from(&version.collection_id);
        self.set_latest_version(version);
        self.last_updated = Some(Utc::now());
    }

    /// Promote this side to published for the given version.
    pub fn publish(&mut self, version: &Version) {
        self.collection_id.clear();
        self.state = Some(State::Published);
        self.set_latest_version(version);
        self.last_updated = Some(Utc::now());
    }

    fn set_latest_version(&mut self, version: &Version) {
        let href = version
            .version_link()
            .map(|link| link.href.clone())
            .unwrap_or_default();
        let links = self.links.get_or_insert_with(DatasetLinks::default);
        links.latest_version = Some(LinkObject::new(version.version.to_string(), href));
    }
}

/// A dataset as stored: the publicly visible Current and the edited Next.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetUpdate {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<Dataset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Dataset>,
}

impl DatasetUpdate {
    /// Publish `version` and flatten: Current and Next become the same
    /// promoted document. Repeating the call with the same version yields the
    /// same document.
    pub fn promote(&self, version: &Version) -> DatasetUpdate {
        let mut promoted = self
            .next
            .clone()
            .or_else(|| self.current.clone())
            .unwrap_or_else(|| Dataset {
                id: self.id.clone(),
                ..Default::default()
            });
        promoted.publish(version);

        DatasetUpdate {
            id: self.id.clone(),
            current: Some(promoted.clone()),
            next: Some(promoted),
        }
    }

    /// The dataset type as seen by authorised (Next) or public (Current) readers.
    pub fn type_for(&self, authorised: bool) -> Option<&str> {
        let side = if authorised {
            self.next.as_ref().or(self.current.as_ref())
        } else {
            self.current.as_ref()
        };
        side.map(|dataset| dataset.dataset_type.as_str())
    }
}
