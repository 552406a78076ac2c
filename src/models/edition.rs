//! Edition documents: a named grouping of versions of a dataset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{LinkObject, State};
use crate::error::{CatalogError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditionLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<LinkObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<LinkObject>,
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<LinkObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versions: Option<LinkObject>,
}

/// One side of an edition document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Edition {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub edition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<State>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<EditionLinks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// An edition as stored, with Current/Next halves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditionUpdate {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<Edition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Edition>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub e_tag: String,
}

impl EditionUpdate {
    /// Point Next's latest-version link at the version being published.
    pub fn publish_links(&mut self, version_link: Option<&LinkObject>) -> Result<()> {
        let link = match version_link {
            Some(link) if !link.href.is_empty() => link,
            _ => return Err(CatalogError::MissingVersionLink),
        };

        let next = self.next.get_or_insert_with(Edition::default);
        let links = next.links.get_or_insert_with(EditionLinks::default);
        links.latest_version = Some(link.clone());
        Ok(())
    }

    /// Mark Next published and copy it into Current.
    pub fn promote(&mut self, version_link: Option<&LinkObject>) -> Result<()> {
        self.next.get_or_insert_with(Edition::default).state = Some(State::Published);
        self.publish_links(version_link)?;
        if let Some(next) = self.next.as_mut() {
            next.last_updated = Some(Utc::now());
        }
        self.current.clone_from(&self.next);
        Ok(())
    }
}
