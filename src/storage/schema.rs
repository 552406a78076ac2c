//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building.
//! Documents are stored as JSON text; the ETag column mirrors the document's
//! own `e_tag` so conditional writes can be expressed in the WHERE clause.

use sea_query::Iden;

/// Datasets table schema.
#[derive(Iden)]
pub enum Datasets {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "document"]
    Document,
}

/// Editions table schema.
#[derive(Iden)]
pub enum Editions {
    Table,
    #[iden = "dataset_id"]
    DatasetId,
    #[iden = "edition"]
    Edition,
    #[iden = "e_tag"]
    ETag,
    #[iden = "document"]
    Document,
}

/// Versions table schema.
#[derive(Iden)]
pub enum Versions {
    Table,
    #[iden = "dataset_id"]
    DatasetId,
    #[iden = "edition"]
    Edition,
    #[iden = "version"]
    Version,
    #[iden = "e_tag"]
    ETag,
    #[iden = "document"]
    Document,
}

/// Instances table schema.
#[derive(Iden)]
pub enum Instances {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "state"]
    State,
    #[iden = "is_published"]
    IsPublished,
}

/// SQL for creating the datasets table.
pub const CREATE_DATASETS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS datasets (
    id TEXT NOT NULL PRIMARY KEY,
    document TEXT NOT NULL
);
"#;

/// SQL for creating the editions table.
pub const CREATE_EDITIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS editions (
    dataset_id TEXT NOT NULL,
    edition TEXT NOT NULL,
    e_tag TEXT NOT NULL,
    document TEXT NOT NULL,
    PRIMARY KEY (dataset_id, edition)
);
"#;

/// SQL for creating the versions table.
pub const CREATE_VERSIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS versions (
    dataset_id TEXT NOT NULL,
    edition TEXT NOT NULL,
    version INTEGER NOT NULL,
    e_tag TEXT NOT NULL,
    document TEXT NOT NULL,
    PRIMARY KEY (dataset_id, edition, version)
);
"#;

/// SQL for creating the instances table.
pub const CREATE_INSTANCES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS instances (
    id TEXT NOT NULL PRIMARY KEY,
    state TEXT,
    is_published INTEGER NOT NULL DEFAULT 0
);
"#;
