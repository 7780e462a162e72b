//! # Storage Rows
//!
//! Loosely typed signer rows as they come out of the data store, and their
//! validation into [`Signer`].

use crate::domain::entities::{SignatureRecord, Signer};
use crate::domain::errors::RowValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{LeaseId, ParseError, ProfileId, SignatureStatus, SignerId, SignerRole};

/// Raw signer row. Roles and statuses are free text with historical
/// spellings; identifiers are strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerRow {
    pub id: String,
    pub lease_id: String,
    #[serde(default)]
    pub profile_id: Option<String>,
    pub role: String,
    #[serde(default = "default_status")]
    pub signature_status: String,
    #[serde(default)]
    pub invited_email: Option<String>,
    #[serde(default)]
    pub invited_name: Option<String>,
    #[serde(default)]
    pub signed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub proof_id: Option<String>,
    #[serde(default)]
    pub document_hash: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub signature_image_path: Option<String>,
}

fn default_status() -> String {
    SignatureStatus::Pending.as_str().to_string()
}

fn field<T>(signer_id: &str, parsed: Result<T, ParseError>) -> Result<T, RowValidationError> {
    parsed.map_err(|source| RowValidationError::Field {
        signer_id: signer_id.to_string(),
        source,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl TryFrom<SignerRow> for Signer {
    type Error = RowValidationError;

    fn try_from(row: SignerRow) -> Result<Self, Self::Error> {
        let id: SignerId = field(&row.id, row.id.parse())?;
        let lease_id: LeaseId = field(&row.id, row.lease_id.parse())?;
        let profile_id = match non_blank(row.profile_id) {
            Some(raw) => Some(field::<ProfileId>(&row.id, raw.parse())?),
            None => None,
        };
        let role: SignerRole = field(&row.id, row.role.parse())?;
        let status: SignatureStatus = field(&row.id, row.signature_status.parse())?;

        let signature = match (status, non_blank(row.proof_id)) {
            (SignatureStatus::Signed, Some(proof_id)) => {
                let signed_at = row.signed_at.ok_or_else(|| RowValidationError::MissingSignedAt {
                    signer_id: row.id.clone(),
                })?;
                Some(SignatureRecord {
                    proof_id,
                    document_hash: row.document_hash.unwrap_or_default(),
                    signed_at,
                    ip_address: row.ip_address,
                    user_agent: row.user_agent,
                    artifact_path: row.signature_image_path.unwrap_or_default(),
                })
            }
            _ => None,
        };

        Ok(Signer {
            id,
            lease_id,
            profile_id,
            role,
            status,
            invited_email: non_blank(row.invited_email),
            invited_name: non_blank(row.invited_name),
            signature,
        })
    }
}

impl From<&Signer> for SignerRow {
    fn from(signer: &Signer) -> Self {
        let record = signer.signature.as_ref();
        Self {
            id: signer.id.to_string(),
            lease_id: signer.lease_id.to_string(),
            profile_id: signer.profile_id.map(|p| p.to_string()),
            role: signer.role.as_str().to_string(),
            signature_status: signer.status.as_str().to_string(),
            invited_email: signer.invited_email.clone(),
            invited_name: signer.invited_name.clone(),
            signed_at: record.map(|r| r.signed_at),
            proof_id: record.map(|r| r.proof_id.clone()),
            document_hash: record.map(|r| r.document_hash.clone()),
            ip_address: record.and_then(|r| r.ip_address.clone()),
            user_agent: record.and_then(|r| r.user_agent.clone()),
            signature_image_path: record.map(|r| r.artifact_path.clone()),
        }
    }
}
