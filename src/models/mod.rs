//! Catalog documents.
//!
//! - [`Version`]: one release of an edition; the unit driven through the
//!   publishing workflow
//! - [`DatasetUpdate`] / [`EditionUpdate`]: parent documents with Current/Next halves
//! - [`Instance`]: import record backing a non-static version

mod dataset;
mod dataset_type;
mod edition;
mod identifiers;
mod instance;
mod state;
mod version;

pub use dataset::{Dataset, DatasetLinks, DatasetUpdate};
pub use dataset_type::DatasetType;
pub use edition::{Edition, EditionLinks, EditionUpdate};
pub use identifiers::{parse_version_number, VersionDetails, VersionIdentifiers};
pub use instance::Instance;
pub use state::State;
pub use version::{
    Alert, DownloadList, DownloadObject, LatestChange, LinkObject, TemporalFrequency, UsageNote,
    Version, VersionLinks,
};
