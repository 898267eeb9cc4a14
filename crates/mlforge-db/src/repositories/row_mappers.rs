//! Row mapping helpers for `SQLite` queries.

use chrono::{DateTime, NaiveDateTime, Utc};
use mlforge_core::domain::{
    Analysis, Dataset, DatasetVersion, Feature, Model, ModelSummary, Owner, Project,
    SamplePoints, StorageDescriptor,
};
use mlforge_core::RepositoryError;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

/// Shared SELECT column list for model queries.
pub const MODEL_SELECT_COLUMNS: &str = "id, name, analysis_id, dataset_version_id, tenant_id, username, target_type, target_location, storage_type, storage_location, status, error, summary, created_at, completed_at";

pub const VERSION_SELECT_COLUMNS: &str =
    "v.id, v.dataset_id, v.version, v.uri, v.sample, v.created_at";

/// Map a sqlx error, keeping uniqueness and foreign key violations apart
/// from plain storage failures.
pub fn map_sqlx(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return RepositoryError::AlreadyExists(db.message().to_string());
        }
        if db.is_foreign_key_violation() {
            return RepositoryError::Constraint(db.message().to_string());
        }
    }
    RepositoryError::Storage(e.to_string())
}

/// Timestamp text as stored in every `*_at` column.
pub fn now_string() -> String {
    Utc::now().to_string()
}

/// Helper to parse datetime strings that may have "UTC" suffix.
pub fn parse_datetime(datetime_str: Option<String>) -> Option<DateTime<Utc>> {
    datetime_str.and_then(|s| {
        let trimmed = s.trim_end_matches(" UTC");
        NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f")
            .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
            .ok()
    })
}

fn get<'r, T>(row: &'r SqliteRow, column: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column)
        .map_err(|e| RepositoryError::Storage(e.to_string()))
}

fn parse_column<T: std::str::FromStr<Err = String>>(
    row: &SqliteRow,
    column: &str,
) -> Result<T, RepositoryError> {
    get::<String>(row, column)?
        .parse()
        .map_err(RepositoryError::Serialization)
}

fn owner(row: &SqliteRow) -> Result<Owner, RepositoryError> {
    Ok(Owner::new(get(row, "tenant_id")?, get::<String>(row, "username")?))
}

fn created_at(row: &SqliteRow) -> Result<DateTime<Utc>, RepositoryError> {
    Ok(parse_datetime(get(row, "created_at")?).unwrap_or_else(Utc::now))
}

fn descriptor(
    row: &SqliteRow,
    type_column: &str,
    location_column: &str,
) -> Result<Option<StorageDescriptor>, RepositoryError> {
    let storage_type: Option<String> = get(row, type_column)?;
    let location: Option<String> = get(row, location_column)?;
    Ok(storage_type
        .zip(location)
        .map(|(t, l)| StorageDescriptor::new(t, l)))
}

pub fn row_to_project(row: &SqliteRow) -> Result<Project, RepositoryError> {
    Ok(Project {
        id: get(row, "id")?,
        name: get(row, "name")?,
        description: get(row, "description")?,
        owner: owner(row)?,
        created_at: created_at(row)?,
    })
}

pub fn row_to_dataset(row: &SqliteRow) -> Result<Dataset, RepositoryError> {
    Ok(Dataset {
        id: get(row, "id")?,
        name: get(row, "name")?,
        owner: owner(row)?,
        data_type: parse_column(row, "data_type")?,
        source_type: get(row, "source_type")?,
        target_type: get(row, "target_type")?,
        comments: get(row, "comments")?,
        created_at: created_at(row)?,
    })
}

pub fn row_to_version(row: &SqliteRow) -> Result<DatasetVersion, RepositoryError> {
    let sample = get::<Option<String>>(row, "sample")?
        .map(|json| serde_json::from_str::<SamplePoints>(&json))
        .transpose()
        .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

    Ok(DatasetVersion {
        id: get(row, "id")?,
        dataset_id: get(row, "dataset_id")?,
        version: get(row, "version")?,
        uri: get(row, "uri")?,
        sample,
        created_at: created_at(row)?,
    })
}

pub fn row_to_analysis(row: &SqliteRow) -> Result<Analysis, RepositoryError> {
    Ok(Analysis {
        id: get(row, "id")?,
        project_id: get(row, "project_id")?,
        name: get(row, "name")?,
        owner: owner(row)?,
        comments: get(row, "comments")?,
        created_at: created_at(row)?,
    })
}

pub fn row_to_feature(row: &SqliteRow) -> Result<Feature, RepositoryError> {
    let index: i64 = get(row, "column_index")?;
    Ok(Feature {
        name: get(row, "name")?,
        index: usize::try_from(index)
            .map_err(|_| RepositoryError::Serialization(format!("negative column index {index}")))?,
        feature_type: parse_column(row, "feature_type")?,
        impute_option: parse_column(row, "impute_option")?,
        include: get(row, "include")?,
    })
}

/// Parse a database row into a Model.
pub fn row_to_model(row: &SqliteRow) -> Result<Model, RepositoryError> {
    let summary = get::<Option<String>>(row, "summary")?
        .map(|json| serde_json::from_str::<ModelSummary>(&json))
        .transpose()
        .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

    Ok(Model {
        id: get(row, "id")?,
        name: get(row, "name")?,
        analysis_id: get(row, "analysis_id")?,
        dataset_version_id: get(row, "dataset_version_id")?,
        owner: owner(row)?,
        storage_target: descriptor(row, "target_type", "target_location")?,
        storage: descriptor(row, "storage_type", "storage_location")?,
        status: parse_column(row, "status")?,
        error: get(row, "error")?,
        summary,
        created_at: created_at(row)?,
        completed_at: parse_datetime(get(row, "completed_at")?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_datetime_round_trip() {
        let now = Utc::now();
        let parsed = parse_datetime(Some(now.to_string())).unwrap();
        assert_eq!(parsed, now);
        assert!(parse_datetime(Some("yesterday".to_string())).is_none());
        assert!(parse_datetime(None).is_none());
    }
}
