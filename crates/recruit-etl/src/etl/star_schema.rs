//! Star-schema transformer
//!
//! Pure mapping from an [`ApplicationAggregate`] to the two dimension records
//! and the fact record of the warehouse. No I/O happens here.
//!
//! Every declared field is always serialised; absent source values become
//! `null`, never a missing key. Counts are always derived from the lists they
//! count and no record carries a wall-clock timestamp, so the same aggregate
//! exported twice on the same day yields byte-identical JSON.

use chrono::NaiveDate;
use recruit_common::types::{
    ApplicationAggregate, ApplicationDocument, MtpAnswers, MtpQuestions,
};
use serde::{Deserialize, Serialize};

/// Candidate dimension, keyed by `candidate_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimCandidate {
    pub candidate_id: String,

    // Identity
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub sexe: Option<String>,
    pub adresse: Option<String>,

    // Employment context
    pub matricule: Option<String>,
    pub poste_actuel: Option<String>,
    pub annees_experience: Option<i32>,

    // Status flags
    pub candidate_status: Option<String>,
    pub is_internal_candidate: Option<bool>,
    pub is_active: Option<bool>,
    pub email_verified: Option<bool>,

    // Profile attributes, all null when the candidate has no profile
    pub skills: Option<Vec<String>>,
    pub skills_text: Option<String>,
    pub skills_count: Option<usize>,
    pub expected_salary_min: Option<i64>,
    pub expected_salary_max: Option<i64>,
    pub education: Option<String>,
    pub linkedin_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub availability: Option<String>,
    pub profile_years_of_experience: Option<i32>,

    pub user_created_at: Option<String>,
    pub ingestion_date: String,
}

/// Job offer dimension, keyed by `job_offer_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimJobOffer {
    pub job_offer_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub contract_type: Option<String>,
    pub department: Option<String>,
    pub offer_status: Option<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub date_limite: Option<String>,

    pub questions_metier: Vec<String>,
    pub questions_talent: Vec<String>,
    pub questions_paradigme: Vec<String>,
    pub metier_count: usize,
    pub talent_count: usize,
    pub paradigme_count: usize,
    pub total_questions_count: usize,

    pub offer_created_at: Option<String>,
    pub ingestion_date: String,
}

/// Document metadata embedded in the fact record; the binary lives elsewhere
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub document_type: String,
    pub file_name: String,
    pub file_size: u64,
    pub uploaded_at: Option<String>,
}

/// Application fact, keyed by `application_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactApplication {
    pub application_id: String,
    pub candidate_id: String,
    pub job_offer_id: String,
    pub status: Option<String>,

    // Reference contact
    pub reference_full_name: Option<String>,
    pub reference_email: Option<String>,
    pub reference_contact: Option<String>,
    pub reference_company: Option<String>,
    pub has_been_manager: Option<bool>,

    // MTP answers
    pub reponses_metier: Vec<String>,
    pub reponses_talent: Vec<String>,
    pub reponses_paradigme: Vec<String>,
    pub reponses_metier_count: usize,
    pub reponses_talent_count: usize,
    pub reponses_paradigme_count: usize,
    pub total_reponses_count: usize,

    // Documents
    pub documents: Vec<DocumentMetadata>,
    pub documents_count: usize,
    pub total_documents_size_bytes: u64,
    pub document_blob_paths: Vec<String>,

    // Time
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub application_year: Option<String>,
    pub application_month: Option<String>,
    pub application_date: Option<String>,
    pub ingestion_date: String,
}

impl FactApplication {
    /// Attach the storage keys of the documents written by the same export
    pub fn with_document_blob_paths(mut self, paths: Vec<String>) -> Self {
        self.document_blob_paths = paths;
        self
    }
}

pub fn build_dim_candidate(aggregate: &ApplicationAggregate, ingestion_date: NaiveDate) -> DimCandidate {
    let candidate = &aggregate.candidate;
    let profile = aggregate.candidate_profile.as_ref();

    let is_internal_candidate = candidate.is_internal_candidate.or_else(|| {
        candidate
            .candidate_status
            .as_deref()
            .map(|status| status.eq_ignore_ascii_case("interne"))
    });

    DimCandidate {
        candidate_id: aggregate.candidate_id.clone(),
        first_name: candidate.first_name.clone(),
        last_name: candidate.last_name.clone(),
        full_name: join_non_empty(
            [candidate.first_name.as_deref(), candidate.last_name.as_deref()],
            " ",
        ),
        email: candidate.email.clone(),
        phone: candidate.phone.clone(),
        date_of_birth: candidate.date_of_birth.clone(),
        sexe: candidate.sexe.clone(),
        adresse: candidate.adresse.clone(),
        matricule: candidate.matricule.clone(),
        poste_actuel: candidate.poste_actuel.clone(),
        annees_experience: candidate.annees_experience,
        candidate_status: candidate.candidate_status.clone(),
        is_internal_candidate,
        is_active: candidate.is_active,
        email_verified: candidate.email_verified,
        skills: profile.map(|p| p.skills.clone()),
        skills_text: profile.and_then(|p| join_non_empty(p.skills.iter().map(String::as_str).map(Some), ", ")),
        skills_count: profile.map(|p| p.skills.len()),
        expected_salary_min: profile.and_then(|p| p.expected_salary_min),
        expected_salary_max: profile.and_then(|p| p.expected_salary_max),
        education: profile.and_then(|p| p.education.clone()),
        linkedin_url: profile.and_then(|p| p.linkedin_url.clone()),
        portfolio_url: profile.and_then(|p| p.portfolio_url.clone()),
        availability: profile.and_then(|p| p.availability.clone()),
        profile_years_of_experience: profile.and_then(|p| p.years_of_experience),
        user_created_at: candidate.created_at.clone(),
        ingestion_date: format_date(ingestion_date),
    }
}

pub fn build_dim_job_offer(aggregate: &ApplicationAggregate, ingestion_date: NaiveDate) -> DimJobOffer {
    let offer = &aggregate.job_offer;
    let MtpQuestions {
        questions_metier,
        questions_talent,
        questions_paradigme,
    } = offer.questions_mtp.clone().unwrap_or_default();

    let metier_count = questions_metier.len();
    let talent_count = questions_talent.len();
    let paradigme_count = questions_paradigme.len();

    DimJobOffer {
        job_offer_id: aggregate.job_offer_id.clone(),
        title: offer.title.clone(),
        description: offer.description.clone(),
        location: offer.location.clone(),
        contract_type: offer.contract_type.clone(),
        department: offer.department.clone(),
        offer_status: offer.offer_status.clone(),
        salary_min: offer.salary_min,
        salary_max: offer.salary_max,
        date_limite: offer.date_limite.clone(),
        questions_metier,
        questions_talent,
        questions_paradigme,
        metier_count,
        talent_count,
        paradigme_count,
        total_questions_count: metier_count + talent_count + paradigme_count,
        offer_created_at: offer.created_at.clone(),
        ingestion_date: format_date(ingestion_date),
    }
}

/// Build the fact record. `document_blob_paths` is left empty; the export
/// service fills it once the document keys are known.
pub fn build_fact_application(
    aggregate: &ApplicationAggregate,
    documents: &[ApplicationDocument],
    ingestion_date: NaiveDate,
) -> FactApplication {
    let MtpAnswers {
        reponses_metier,
        reponses_talent,
        reponses_paradigme,
    } = aggregate.mtp_answers.clone().unwrap_or_default();

    let reponses_metier_count = reponses_metier.len();
    let reponses_talent_count = reponses_talent.len();
    let reponses_paradigme_count = reponses_paradigme.len();

    let documents: Vec<DocumentMetadata> = documents
        .iter()
        .map(|doc| DocumentMetadata {
            document_type: doc.document_type.clone(),
            file_name: doc.file_name.clone(),
            file_size: doc.effective_size(),
            uploaded_at: doc.uploaded_at.clone(),
        })
        .collect();

    let created_at = aggregate.created_at.as_deref();

    FactApplication {
        application_id: aggregate.id.clone(),
        candidate_id: aggregate.candidate_id.clone(),
        job_offer_id: aggregate.job_offer_id.clone(),
        status: aggregate.status.clone(),
        reference_full_name: aggregate.reference_full_name.clone(),
        reference_email: aggregate.reference_email.clone(),
        reference_contact: aggregate.reference_contact.clone(),
        reference_company: aggregate.reference_company.clone(),
        has_been_manager: aggregate.has_been_manager,
        reponses_metier,
        reponses_talent,
        reponses_paradigme,
        reponses_metier_count,
        reponses_talent_count,
        reponses_paradigme_count,
        total_reponses_count: reponses_metier_count + reponses_talent_count + reponses_paradigme_count,
        documents_count: documents.len(),
        total_documents_size_bytes: documents.iter().map(|d| d.file_size).sum(),
        documents,
        document_blob_paths: Vec::new(),
        created_at: aggregate.created_at.clone(),
        updated_at: aggregate.updated_at.clone(),
        application_year: timestamp_prefix(created_at, 4),
        application_month: timestamp_prefix(created_at, 7),
        application_date: timestamp_prefix(created_at, 10),
        ingestion_date: format_date(ingestion_date),
    }
}

/// Leading `len` characters of an ISO timestamp, taken literally.
///
/// Downstream consumers match on these exact substrings (`2025`, `2025-10`,
/// `2025-10-17`), so the timestamp is sliced rather than parsed. Too-short or
/// non-ASCII prefixes yield `None`.
fn timestamp_prefix(timestamp: Option<&str>, len: usize) -> Option<String> {
    timestamp.and_then(|ts| ts.get(..len)).map(str::to_string)
}

fn join_non_empty<'a>(parts: impl IntoIterator<Item = Option<&'a str>>, separator: &str) -> Option<String> {
    let parts: Vec<&str> = parts
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(separator))
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use recruit_common::types::{Candidate, CandidateProfile, JobOffer};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 17).unwrap()
    }

    fn aggregate() -> ApplicationAggregate {
        ApplicationAggregate {
            id: "A1".to_string(),
            candidate_id: "C1".to_string(),
            job_offer_id: "J1".to_string(),
            status: Some("candidature".to_string()),
            mtp_answers: Some(MtpAnswers {
                reponses_metier: vec!["r1".into(), "r2".into()],
                reponses_talent: vec!["t1".into()],
                reponses_paradigme: vec![],
            }),
            reference_full_name: Some("Jean Ndong".to_string()),
            created_at: Some("2025-10-17T08:30:00.123456+00:00".to_string()),
            candidate: Candidate {
                id: "C1".to_string(),
                first_name: Some("Awa".to_string()),
                last_name: Some("Mba".to_string()),
                candidate_status: Some("interne".to_string()),
                ..Default::default()
            },
            candidate_profile: Some(CandidateProfile {
                skills: vec!["SQL".into(), "Python".into()],
                expected_salary_min: Some(500_000),
                education: Some("Master".to_string()),
                ..Default::default()
            }),
            job_offer: JobOffer {
                id: "J1".to_string(),
                title: Some("Data Analyst".to_string()),
                offer_status: Some("tous".to_string()),
                questions_mtp: Some(MtpQuestions {
                    questions_metier: vec!["q1".into(), "q2".into(), "q3".into()],
                    questions_talent: vec!["q4".into()],
                    questions_paradigme: vec!["q5".into(), "q6".into()],
                }),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn document(document_type: &str, size: usize) -> ApplicationDocument {
        ApplicationDocument {
            document_type: document_type.to_string(),
            file_name: format!("{}.pdf", document_type),
            file_data: Some(vec![7; size]),
            file_size: None,
            uploaded_at: Some("2025-10-17T08:31:00Z".to_string()),
        }
    }

    #[test]
    fn test_dim_candidate_merges_profile() {
        let dim = build_dim_candidate(&aggregate(), date());

        assert_eq!(dim.candidate_id, "C1");
        assert_eq!(dim.full_name.as_deref(), Some("Awa Mba"));
        assert_eq!(dim.is_internal_candidate, Some(true));
        assert_eq!(dim.skills_text.as_deref(), Some("SQL, Python"));
        assert_eq!(dim.skills_count, Some(2));
        assert_eq!(dim.expected_salary_min, Some(500_000));
        assert_eq!(dim.ingestion_date, "2025-10-17");
    }

    #[test]
    fn test_dim_candidate_without_profile_keeps_null_fields() {
        let mut agg = aggregate();
        agg.candidate_profile = None;

        let dim = build_dim_candidate(&agg, date());
        assert_eq!(dim.candidate_id, "C1");
        assert!(dim.skills.is_none());
        assert!(dim.skills_text.is_none());
        assert!(dim.skills_count.is_none());
        assert!(dim.expected_salary_min.is_none());
        assert!(dim.expected_salary_max.is_none());
        assert!(dim.education.is_none());
        assert!(dim.linkedin_url.is_none());
        assert!(dim.portfolio_url.is_none());
        assert!(dim.availability.is_none());
        assert!(dim.profile_years_of_experience.is_none());

        // Keys are present with null values, not omitted
        let json = serde_json::to_value(&dim).unwrap();
        for key in ["skills", "expected_salary_min", "education", "linkedin_url"] {
            assert_eq!(json.get(key), Some(&serde_json::Value::Null), "{}", key);
        }
    }

    #[test]
    fn test_explicit_internal_flag_wins() {
        let mut agg = aggregate();
        agg.candidate.is_internal_candidate = Some(false);
        assert_eq!(build_dim_candidate(&agg, date()).is_internal_candidate, Some(false));

        agg.candidate.is_internal_candidate = None;
        agg.candidate.candidate_status = None;
        assert_eq!(build_dim_candidate(&agg, date()).is_internal_candidate, None);
    }

    #[test]
    fn test_full_name_with_missing_parts() {
        let mut agg = aggregate();
        agg.candidate.first_name = None;
        assert_eq!(build_dim_candidate(&agg, date()).full_name.as_deref(), Some("Mba"));

        agg.candidate.last_name = Some("  ".to_string());
        assert_eq!(build_dim_candidate(&agg, date()).full_name, None);
    }

    #[test]
    fn test_dim_job_offer_counts() {
        let dim = build_dim_job_offer(&aggregate(), date());
        assert_eq!(dim.metier_count, 3);
        assert_eq!(dim.talent_count, 1);
        assert_eq!(dim.paradigme_count, 2);
        assert_eq!(dim.total_questions_count, 6);
        assert_eq!(dim.offer_status.as_deref(), Some("tous"));
    }

    #[test]
    fn test_dim_job_offer_without_questions() {
        let mut agg = aggregate();
        agg.job_offer.questions_mtp = None;
        let dim = build_dim_job_offer(&agg, date());
        assert_eq!(dim.total_questions_count, 0);
        assert!(dim.questions_metier.is_empty());
    }

    #[test]
    fn test_fact_application_derivations() {
        let docs = vec![document("cv", 100), document("diplome", 50)];
        let fact = build_fact_application(&aggregate(), &docs, date());

        assert_eq!(fact.application_id, "A1");
        assert_eq!(fact.candidate_id, "C1");
        assert_eq!(fact.job_offer_id, "J1");
        assert_eq!(fact.reponses_metier_count, 2);
        assert_eq!(fact.reponses_talent_count, 1);
        assert_eq!(fact.reponses_paradigme_count, 0);
        assert_eq!(fact.total_reponses_count, 3);
        assert_eq!(fact.documents_count, 2);
        assert_eq!(fact.total_documents_size_bytes, 150);
        assert!(fact.document_blob_paths.is_empty());
        assert_eq!(fact.documents[0].uploaded_at.as_deref(), Some("2025-10-17T08:31:00Z"));
    }

    #[test]
    fn test_application_date_fields_are_literal_slices() {
        let fact = build_fact_application(&aggregate(), &[], date());
        assert_eq!(fact.application_year.as_deref(), Some("2025"));
        assert_eq!(fact.application_month.as_deref(), Some("2025-10"));
        assert_eq!(fact.application_date.as_deref(), Some("2025-10-17"));

        // Slicing, not parsing: whatever the serialisation, the prefix is copied
        let mut agg = aggregate();
        agg.created_at = Some("2025/10/17 08:30".to_string());
        let fact = build_fact_application(&agg, &[], date());
        assert_eq!(fact.application_month.as_deref(), Some("2025/10"));
        assert_eq!(fact.application_date.as_deref(), Some("2025/10/17"));
    }

    #[test]
    fn test_short_or_missing_timestamp() {
        let mut agg = aggregate();
        agg.created_at = Some("2025-1".to_string());
        let fact = build_fact_application(&agg, &[], date());
        assert_eq!(fact.application_year.as_deref(), Some("2025"));
        assert_eq!(fact.application_month, None);
        assert_eq!(fact.application_date, None);

        agg.created_at = None;
        let fact = build_fact_application(&agg, &[], date());
        assert_eq!(fact.application_year, None);
    }

    #[test]
    fn test_with_document_blob_paths() {
        let fact = build_fact_application(&aggregate(), &[document("cv", 1)], date())
            .with_document_blob_paths(vec!["documents/ingestion_date=2025-10-17/A1/cv_cv.pdf".into()]);
        assert_eq!(fact.document_blob_paths.len(), 1);
        assert_eq!(fact.documents_count, 1);
    }

    #[test]
    fn test_builders_are_deterministic() {
        let agg = aggregate();
        let docs = vec![document("cv", 10)];
        assert_eq!(
            serde_json::to_vec(&build_fact_application(&agg, &docs, date())).unwrap(),
            serde_json::to_vec(&build_fact_application(&agg, &docs, date())).unwrap()
        );
        assert_eq!(build_dim_candidate(&agg, date()), build_dim_candidate(&agg, date()));
    }

    proptest! {
        #[test]
        fn prop_count_invariants(
            metier in proptest::collection::vec("[a-z]{0,8}", 0..6),
            talent in proptest::collection::vec("[a-z]{0,8}", 0..6),
            paradigme in proptest::collection::vec("[a-z]{0,8}", 0..6),
        ) {
            let mut agg = aggregate();
            agg.mtp_answers = Some(MtpAnswers {
                reponses_metier: metier.clone(),
                reponses_talent: talent.clone(),
                reponses_paradigme: paradigme.clone(),
            });
            agg.job_offer.questions_mtp = Some(MtpQuestions {
                questions_metier: metier,
                questions_talent: talent,
                questions_paradigme: paradigme,
            });

            let fact = build_fact_application(&agg, &[], date());
            prop_assert_eq!(
                fact.total_reponses_count,
                fact.reponses_metier_count + fact.reponses_talent_count + fact.reponses_paradigme_count
            );

            let offer = build_dim_job_offer(&agg, date());
            prop_assert_eq!(
                offer.total_questions_count,
                offer.metier_count + offer.talent_count + offer.paradigme_count
            );
        }
    }
}
