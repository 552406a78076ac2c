//! Dataset type discriminator.
//!
//! Every dataset type owns its own workflow graph (see
//! [`crate::workflow::transitions`]) and, for generated artifacts, its own
//! downloads generator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Known dataset types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DatasetType {
    /// Legacy CMD datasets, also addressed as `v4`.
    Filterable,
    CantabularTable,
    CantabularBlob,
    CantabularFlexibleTable,
    CantabularMultivariateTable,
    Nomis,
    Static,
}

impl DatasetType {
    pub const ALL: [DatasetType; 7] = [
        DatasetType::Filterable,
        DatasetType::CantabularTable,
        DatasetType::CantabularBlob,
        DatasetType::CantabularFlexibleTable,
        DatasetType::CantabularMultivariateTable,
        DatasetType::Nomis,
        DatasetType::Static,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetType::Filterable => "filterable",
            DatasetType::CantabularTable => "cantabular_table",
            DatasetType::CantabularBlob => "cantabular_blob",
            DatasetType::CantabularFlexibleTable => "cantabular_flexible_table",
            DatasetType::CantabularMultivariateTable => "cantabular_multivariate_table",
            DatasetType::Nomis => "nomis",
            DatasetType::Static => "static",
        }
    }

    /// Resolve a stored type string. Documents written before types existed
    /// carry an empty string and are treated as filterable.
    pub fn resolve(raw: &str) -> Result<Self, CatalogError> {
        match raw {
            "" | "v4" | "filterable" => Ok(DatasetType::Filterable),
            other => DatasetType::ALL
                .into_iter()
                .find(|ty| ty.as_str() == other)
                .ok_or(CatalogError::InvalidDatasetType),
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, DatasetType::Static)
    }

    pub fn is_cantabular(&self) -> bool {
        matches!(
            self,
            DatasetType::CantabularTable
                | DatasetType::CantabularBlob
                | DatasetType::CantabularFlexibleTable
                | DatasetType::CantabularMultivariateTable
        )
    }
}

impl fmt::Display for DatasetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetType {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DatasetType::resolve(s)
    }
}

impl TryFrom<String> for DatasetType {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        DatasetType::resolve(&value)
    }
}

impl From<DatasetType> for String {
    fn from(value: DatasetType) -> Self {
        value.as_str().to_string()
    }
}
