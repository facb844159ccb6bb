//! Application aggregate types
//!
//! These structures are the read-only input of the export pipeline. They are
//! assembled by the relational collaborator for a single submitted
//! application and discarded once the export completes.
//!
//! Every optional attribute is an `Option`, so a missing JSON key and an
//! explicit `null` deserialise to the same value.

use crate::error::{RecruitError, Result};
use serde::{Deserialize, Serialize};

// ============================================================================
// Candidate
// ============================================================================

/// Candidate (user) record as stored by the recruitment backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub sexe: Option<String>,
    pub adresse: Option<String>,
    pub matricule: Option<String>,
    pub poste_actuel: Option<String>,
    pub annees_experience: Option<i32>,
    /// `interne` or `externe`
    pub candidate_status: Option<String>,
    pub is_internal_candidate: Option<bool>,
    pub is_active: Option<bool>,
    pub email_verified: Option<bool>,
    pub created_at: Option<String>,
}

/// Extended candidate profile, absent for candidates who never filled it in
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    #[serde(default)]
    pub skills: Vec<String>,
    pub expected_salary_min: Option<i64>,
    pub expected_salary_max: Option<i64>,
    pub education: Option<String>,
    pub linkedin_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub availability: Option<String>,
    pub years_of_experience: Option<i32>,
}

// ============================================================================
// Job offer
// ============================================================================

/// MTP questionnaire attached to a job offer (métier, talent, paradigme)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MtpQuestions {
    #[serde(default)]
    pub questions_metier: Vec<String>,
    #[serde(default)]
    pub questions_talent: Vec<String>,
    #[serde(default)]
    pub questions_paradigme: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobOffer {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub contract_type: Option<String>,
    pub department: Option<String>,
    /// Visibility scope of the offer (`tous`, `interne`, `externe`)
    pub offer_status: Option<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub date_limite: Option<String>,
    pub questions_mtp: Option<MtpQuestions>,
    pub created_at: Option<String>,
}

// ============================================================================
// Application
// ============================================================================

/// Candidate answers to the MTP questionnaire
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MtpAnswers {
    #[serde(default)]
    pub reponses_metier: Vec<String>,
    #[serde(default)]
    pub reponses_talent: Vec<String>,
    #[serde(default)]
    pub reponses_paradigme: Vec<String>,
}

/// A submitted application with its candidate, profile and job offer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationAggregate {
    pub id: String,
    pub candidate_id: String,
    pub job_offer_id: String,
    pub status: Option<String>,
    pub mtp_answers: Option<MtpAnswers>,
    pub reference_full_name: Option<String>,
    pub reference_email: Option<String>,
    pub reference_contact: Option<String>,
    pub reference_company: Option<String>,
    pub has_been_manager: Option<bool>,
    /// ISO-8601 creation timestamp as serialised by the relational store
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub candidate: Candidate,
    pub candidate_profile: Option<CandidateProfile>,
    pub job_offer: JobOffer,
}

impl ApplicationAggregate {
    /// Check that the nested records belong to this application.
    ///
    /// The fact record's foreign keys must match the keys of the dimension
    /// records written alongside it.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(RecruitError::InvalidAggregate(
                "application id cannot be empty".to_string(),
            ));
        }
        if self.candidate_id != self.candidate.id {
            return Err(RecruitError::InvalidAggregate(format!(
                "candidate_id '{}' does not match candidate record '{}'",
                self.candidate_id, self.candidate.id
            )));
        }
        if self.job_offer_id != self.job_offer.id {
            return Err(RecruitError::InvalidAggregate(format!(
                "job_offer_id '{}' does not match job offer record '{}'",
                self.job_offer_id, self.job_offer.id
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Documents
// ============================================================================

/// A document uploaded with an application
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationDocument {
    /// `cv`, `cover_letter`, `diplome`, `certificats`, ...
    pub document_type: String,
    pub file_name: String,
    /// Binary content; base64 on the JSON wire
    #[serde(default, with = "base64_payload")]
    pub file_data: Option<Vec<u8>>,
    pub file_size: Option<u64>,
    pub uploaded_at: Option<String>,
}

impl ApplicationDocument {
    /// Declared size, falling back to the payload length
    pub fn effective_size(&self) -> u64 {
        self.file_size
            .or_else(|| self.file_data.as_ref().map(|data| data.len() as u64))
            .unwrap_or(0)
    }

    /// Raw bytes to store, if the loader provided them
    pub fn payload(&self) -> Option<&[u8]> {
        self.file_data.as_deref()
    }
}

/// An aggregate together with its documents, as handed over by a loader
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationSnapshot {
    pub application: ApplicationAggregate,
    #[serde(default)]
    pub documents: Vec<ApplicationDocument>,
}

impl ApplicationSnapshot {
    /// Parse and validate a JSON snapshot
    pub fn from_json_slice(raw: &[u8]) -> Result<Self> {
        let snapshot: Self = serde_json::from_slice(raw)?;
        snapshot.application.validate()?;
        Ok(snapshot)
    }
}

mod base64_payload {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match data {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        encoded
            .map(|value| STANDARD.decode(value.as_bytes()).map_err(serde::de::Error::custom))
            .transpose()
    }
}
