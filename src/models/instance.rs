//! Instance records: the import job output that backs a non-static version.

use serde::{Deserialize, Serialize};

use super::State;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<State>,
    #[serde(default)]
    pub is_published: bool,
}
