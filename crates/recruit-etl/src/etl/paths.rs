//! Deterministic storage keys with ingestion-date partitioning
//!
//! Structured records land under
//! `{category}/{entity_type}/ingestion_date={YYYY-MM-DD}/{entity_id}.json`
//! and documents under
//! `documents/ingestion_date={YYYY-MM-DD}/{application_id}/{document_type}_{file_name}`.
//!
//! The same inputs always produce the same key, so re-exporting an
//! application on the same day overwrites the previous objects in place.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A key could not be built from the given entity type or identifiers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidKeyError {
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    #[error("{field} '{value}' is not a valid key segment")]
    InvalidSegment { field: &'static str, value: String },

    #[error("Unknown entity type: '{0}'")]
    UnknownEntityType(String),

    #[error("Entity type '{0}' requires a dedicated key builder")]
    UnsupportedEntityType(EntityType),
}

/// Warehouse tables and object families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    DimCandidates,
    DimJobOffers,
    FactApplications,
    Documents,
}

impl EntityType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::DimCandidates => "dim_candidates",
            EntityType::DimJobOffers => "dim_job_offers",
            EntityType::FactApplications => "fact_applications",
            EntityType::Documents => "documents",
        }
    }

    /// Top-level prefix the entity type is stored under
    pub fn category(self) -> &'static str {
        match self {
            EntityType::DimCandidates | EntityType::DimJobOffers => "dimensions",
            EntityType::FactApplications => "facts",
            EntityType::Documents => "documents",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = InvalidKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dim_candidates" => Ok(EntityType::DimCandidates),
            "dim_job_offers" => Ok(EntityType::DimJobOffers),
            "fact_applications" => Ok(EntityType::FactApplications),
            "documents" => Ok(EntityType::Documents),
            other => Err(InvalidKeyError::UnknownEntityType(other.to_string())),
        }
    }
}

/// Today's UTC date, the default ingestion partition
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Render a date as a partition directory, `ingestion_date=YYYY-MM-DD`
pub fn partition(date: NaiveDate) -> String {
    format!("ingestion_date={}", date.format("%Y-%m-%d"))
}

/// Key of a dimension or fact record.
///
/// `ingestion_date` defaults to the current UTC date.
pub fn build_key(
    entity_type: EntityType,
    entity_id: &str,
    ingestion_date: Option<NaiveDate>,
) -> Result<String, InvalidKeyError> {
    if entity_type == EntityType::Documents {
        return Err(InvalidKeyError::UnsupportedEntityType(entity_type));
    }
    let entity_id = validate_segment("entity_id", entity_id)?;
    let date = ingestion_date.unwrap_or_else(today);

    Ok(format!(
        "{}/{}/{}/{}.json",
        entity_type.category(),
        entity_type.as_str(),
        partition(date),
        entity_id
    ))
}

/// Key of a binary document belonging to an application
pub fn build_document_key(
    application_id: &str,
    document_type: &str,
    file_name: &str,
    ingestion_date: Option<NaiveDate>,
) -> Result<String, InvalidKeyError> {
    let application_id = validate_segment("application_id", application_id)?;
    let document_type = validate_segment("document_type", document_type)?;
    let file_name = validate_segment("file_name", file_name)?;
    let date = ingestion_date.unwrap_or_else(today);

    Ok(format!(
        "{}/{}/{}/{}_{}",
        EntityType::Documents.category(),
        partition(date),
        application_id,
        document_type,
        file_name
    ))
}

/// Validate a single key segment.
///
/// Rejects blank values, surrounding whitespace, path separators, control
/// characters, `.` and `..`.
pub fn validate_segment<'a>(field: &'static str, value: &'a str) -> Result<&'a str, InvalidKeyError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(InvalidKeyError::Empty { field });
    }
    if trimmed != value
        || value == "."
        || value == ".."
        || value.contains(['/', '\\'])
        || value.chars().any(char::is_control)
    {
        return Err(InvalidKeyError::InvalidSegment {
            field,
            value: value.to_string(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 17).unwrap()
    }

    #[test]
    fn test_dimension_and_fact_keys() {
        assert_eq!(
            build_key(EntityType::DimCandidates, "C1", Some(date())).unwrap(),
            "dimensions/dim_candidates/ingestion_date=2025-10-17/C1.json"
        );
        assert_eq!(
            build_key(EntityType::DimJobOffers, "J1", Some(date())).unwrap(),
            "dimensions/dim_job_offers/ingestion_date=2025-10-17/J1.json"
        );
        assert_eq!(
            build_key(EntityType::FactApplications, "A1", Some(date())).unwrap(),
            "facts/fact_applications/ingestion_date=2025-10-17/A1.json"
        );
    }

    #[test]
    fn test_document_key() {
        assert_eq!(
            build_document_key("A1", "cv", "cv.pdf", Some(date())).unwrap(),
            "documents/ingestion_date=2025-10-17/A1/cv_cv.pdf"
        );
    }

    #[test]
    fn test_default_date_is_today() {
        let key = build_key(EntityType::FactApplications, "A1", None).unwrap();
        assert!(key.contains(&partition(today())));
    }

    #[test]
    fn test_empty_id_rejected() {
        assert_eq!(
            build_key(EntityType::DimCandidates, "", Some(date())),
            Err(InvalidKeyError::Empty { field: "entity_id" })
        );
        assert_eq!(
            build_document_key("A1", "cv", "  ", Some(date())),
            Err(InvalidKeyError::Empty { field: "file_name" })
        );
    }

    #[test]
    fn test_escaping_segments_rejected() {
        for bad in ["../A1", "a/b", "a\\b", "..", " A1", "A1\n"] {
            assert!(
                matches!(
                    build_key(EntityType::FactApplications, bad, Some(date())),
                    Err(InvalidKeyError::InvalidSegment { .. })
                ),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_documents_need_document_builder() {
        assert_eq!(
            build_key(EntityType::Documents, "A1", Some(date())),
            Err(InvalidKeyError::UnsupportedEntityType(EntityType::Documents))
        );
    }

    #[test]
    fn test_entity_type_from_str() {
        assert_eq!("dim_job_offers".parse::<EntityType>(), Ok(EntityType::DimJobOffers));
        assert_eq!(
            "dim_users".parse::<EntityType>(),
            Err(InvalidKeyError::UnknownEntityType("dim_users".to_string()))
        );
        for entity in [
            EntityType::DimCandidates,
            EntityType::DimJobOffers,
            EntityType::FactApplications,
            EntityType::Documents,
        ] {
            assert_eq!(entity.to_string().parse::<EntityType>(), Ok(entity));
        }
    }

    proptest! {
        #[test]
        fn prop_build_key_is_deterministic(
            id in "[A-Za-z0-9_-]{1,36}",
            days in 0i64..20_000,
        ) {
            let date = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap() + chrono::Duration::days(days);
            let first = build_key(EntityType::FactApplications, &id, Some(date)).unwrap();
            let second = build_key(EntityType::FactApplications, &id, Some(date)).unwrap();
            prop_assert_eq!(&first, &second);
            let expected_suffix = format!("/{}.json", id);
            prop_assert!(first.ends_with(&expected_suffix));
        }

        #[test]
        fn prop_document_keys_differ_by_type(
            app in "[A-Za-z0-9-]{1,20}",
            file in "[a-z]{1,10}\\.pdf",
        ) {
            let cv = build_document_key(&app, "cv", &file, Some(date())).unwrap();
            let diplome = build_document_key(&app, "diplome", &file, Some(date())).unwrap();
            prop_assert_ne!(cv, diplome);
        }
    }
}
