//! Shared fixtures for the recruitment ETL integration tests

#![allow(dead_code)]

use chrono::NaiveDate;
use recruit_common::types::{
    ApplicationAggregate, ApplicationDocument, ApplicationSnapshot, Candidate, CandidateProfile, JobOffer,
    MtpAnswers, MtpQuestions,
};

pub const APPLICATION_ID: &str = "A1";
pub const CANDIDATE_ID: &str = "C1";
pub const JOB_OFFER_ID: &str = "J1";

/// Partition date used by every deterministic scenario
pub fn ingestion_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 17).unwrap()
}

pub fn sample_aggregate() -> ApplicationAggregate {
    ApplicationAggregate {
        id: APPLICATION_ID.to_string(),
        candidate_id: CANDIDATE_ID.to_string(),
        job_offer_id: JOB_OFFER_ID.to_string(),
        status: Some("submitted".to_string()),
        mtp_answers: Some(MtpAnswers {
            reponses_metier: vec!["m1".to_string(), "m2".to_string()],
            reponses_talent: vec!["t1".to_string()],
            reponses_paradigme: vec!["p1".to_string(), "p2".to_string(), "p3".to_string()],
        }),
        reference_full_name: Some("Marie Nguema".to_string()),
        reference_email: Some("marie@example.com".to_string()),
        reference_contact: Some("+241 01 02 03 04".to_string()),
        reference_company: Some("SEEG".to_string()),
        has_been_manager: Some(true),
        created_at: Some("2025-10-17T08:30:00Z".to_string()),
        updated_at: Some("2025-10-17T08:35:00Z".to_string()),
        candidate: Candidate {
            id: CANDIDATE_ID.to_string(),
            first_name: Some("Jean".to_string()),
            last_name: Some("Mba".to_string()),
            email: Some("jean.mba@example.com".to_string()),
            candidate_status: Some("externe".to_string()),
            is_internal_candidate: Some(false),
            created_at: Some("2025-09-01T10:00:00Z".to_string()),
            ..Default::default()
        },
        candidate_profile: Some(CandidateProfile {
            skills: vec!["Rust".to_string(), "SQL".to_string()],
            years_of_experience: Some(5),
            ..Default::default()
        }),
        job_offer: JobOffer {
            id: JOB_OFFER_ID.to_string(),
            title: Some("Data Engineer".to_string()),
            contract_type: Some("CDI".to_string()),
            questions_mtp: Some(MtpQuestions {
                questions_metier: vec!["q1".to_string(), "q2".to_string()],
                questions_talent: vec!["q3".to_string()],
                questions_paradigme: vec!["q4".to_string()],
            }),
            created_at: Some("2025-08-01T09:00:00Z".to_string()),
            ..Default::default()
        },
    }
}

pub fn document(document_type: &str, file_name: &str, data: Option<Vec<u8>>) -> ApplicationDocument {
    ApplicationDocument {
        document_type: document_type.to_string(),
        file_name: file_name.to_string(),
        file_size: data.as_ref().map(|d| d.len() as u64),
        file_data: data,
        uploaded_at: Some("2025-10-17T08:29:00Z".to_string()),
    }
}

/// Three 1024-byte PDF documents
pub fn sample_documents() -> Vec<ApplicationDocument> {
    vec![
        document("cv", "cv.pdf", Some(vec![b'a'; 1024])),
        document("cover_letter", "lettre.pdf", Some(vec![b'b'; 1024])),
        document("diplome", "diplome.pdf", Some(vec![b'c'; 1024])),
    ]
}

pub fn sample_snapshot() -> ApplicationSnapshot {
    ApplicationSnapshot {
        application: sample_aggregate(),
        documents: sample_documents(),
    }
}
