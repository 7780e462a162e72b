//! # Domain Entities
//!
//! Validated data model of the signature core. Rows coming from the data
//! store are converted into these types in `domain::records`; nothing past
//! that boundary sees raw strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{LeaseId, LeaseStatus, ProfileId, PropertyId, SignatureStatus, SignerId, SignerRole};
use std::collections::BTreeMap;

// =============================================================================
// Signers
// =============================================================================

/// Proof linkage stored on a signer row once it is signed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    pub proof_id: String,
    pub document_hash: String,
    pub signed_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    /// Path of the stored signature image.
    pub artifact_path: String,
}

/// One required signatory on a lease.
///
/// `profile_id` is `None` until the row is claimed and never changes once
/// set. `status` only moves from `Pending` to `Signed`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signer {
    pub id: SignerId,
    pub lease_id: LeaseId,
    pub profile_id: Option<ProfileId>,
    pub role: SignerRole,
    pub status: SignatureStatus,
    pub invited_email: Option<String>,
    pub invited_name: Option<String>,
    /// Present on rows signed through this core. Legacy rows may be
    /// `Signed` without a record.
    pub signature: Option<SignatureRecord>,
}

impl Signer {
    /// A pending row bound to `profile_id`, as created for a synthesized owner.
    pub fn bound(lease_id: LeaseId, profile_id: ProfileId, role: SignerRole) -> Self {
        Self {
            id: SignerId::new(),
            lease_id,
            profile_id: Some(profile_id),
            role,
            status: SignatureStatus::Pending,
            invited_email: None,
            invited_name: None,
            signature: None,
        }
    }

    /// An unbound pending row addressed by invitation email.
    pub fn invited(lease_id: LeaseId, role: SignerRole, email: &str, name: Option<&str>) -> Self {
        Self {
            id: SignerId::new(),
            lease_id,
            profile_id: None,
            role,
            status: SignatureStatus::Pending,
            invited_email: Some(email.to_string()),
            invited_name: name.map(str::to_string),
            signature: None,
        }
    }

    /// An unbound pending row addressed only by its role.
    pub fn placeholder(lease_id: LeaseId, role: SignerRole) -> Self {
        Self {
            id: SignerId::new(),
            lease_id,
            profile_id: None,
            role,
            status: SignatureStatus::Pending,
            invited_email: None,
            invited_name: None,
            signature: None,
        }
    }

    pub fn is_signed(&self) -> bool {
        self.status.is_signed()
    }

    pub fn is_bound(&self) -> bool {
        self.profile_id.is_some()
    }

    pub fn is_bound_to(&self, profile_id: ProfileId) -> bool {
        self.profile_id == Some(profile_id)
    }

    /// Invitation email matches, ignoring case and surrounding whitespace.
    pub fn is_invited_as(&self, email: &str) -> bool {
        self.invited_email
            .as_deref()
            .is_some_and(|invited| invited.trim().eq_ignore_ascii_case(email.trim()))
    }
}

// =============================================================================
// Lease / profile read models
// =============================================================================

/// What the signature core needs to know about a lease.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseSummary {
    pub id: LeaseId,
    pub status: LeaseStatus,
    pub property_id: PropertyId,
    pub property_address: String,
    /// Recorded owner of the underlying property.
    pub owner_profile_id: Option<ProfileId>,
}

impl LeaseSummary {
    pub fn is_owned_by(&self, profile_id: ProfileId) -> bool {
        self.owner_profile_id == Some(profile_id)
    }
}

/// A user profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    /// Supplementary identity data (ID document) is on file.
    #[serde(default)]
    pub identity_document_on_file: bool,
}

impl Profile {
    /// "First Last", falling back to the email, then to a generic label.
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !name.is_empty() {
            return name;
        }
        self.email.clone().unwrap_or_else(|| "Utilisateur".to_string())
    }
}

/// A party to notify: who they are and where to reach them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Party {
    pub profile_id: Option<ProfileId>,
    pub email: Option<String>,
    pub name: String,
}

// =============================================================================
// Sign request / outcome
// =============================================================================

/// Authenticated caller as supplied by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub profile_id: ProfileId,
    pub email: String,
}

/// The hand-drawn signature image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureArtifact {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl SignatureArtifact {
    pub fn png(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            content_type: "image/png".to_string(),
        }
    }

    /// File extension used in the storage path for an accepted content type.
    pub fn extension_for(content_type: &str) -> &'static str {
        match content_type {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/svg+xml" => "svg",
            "image/webp" => "webp",
            _ => "png",
        }
    }
}

/// Client-side context recorded with the signature.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMetadata {
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    /// Free-form device details (screen size, platform, touch support...).
    #[serde(default)]
    pub device: BTreeMap<String, String>,
}

/// Inbound `Sign` operation.
#[derive(Clone, Debug)]
pub struct SignRequest {
    pub lease_id: LeaseId,
    pub caller: Caller,
    pub signature: Option<SignatureArtifact>,
    pub client: ClientMetadata,
}

/// Successful `Sign` result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignOutcome {
    pub proof_id: String,
    pub lease_status: LeaseStatus,
    pub signer_id: SignerId,
    pub signed_at: DateTime<Utc>,
}

/// Computed decision of the rights resolver for an eligible caller.
/// Never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignatureRights {
    /// Sign against this row, already bound to the caller.
    Existing(Signer),
    /// Caller owns the property and the lease has no row for the role yet.
    Synthesize(SignerRole),
}

// =============================================================================
// Proof
// =============================================================================

/// How the signer's identity was established.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityMethod {
    /// Authenticated owner account, treated as pre-verified.
    OwnerAccount,
    /// Authenticated tenant account (possession of the account).
    AccountPossession,
    /// Account plus an identity document on file.
    IdentityDocument,
}

impl IdentityMethod {
    /// Owners are pre-verified; everyone else is verified by account
    /// possession, upgraded when an ID document is on file.
    pub fn for_signer(role: SignerRole, identity_document_on_file: bool) -> (bool, Self) {
        if role.is_owner_family() {
            return (true, Self::OwnerAccount);
        }
        if identity_document_on_file {
            (true, Self::IdentityDocument)
        } else {
            (true, Self::AccountPossession)
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::OwnerAccount => "Compte propriétaire authentifié",
            Self::AccountPossession => "Compte locataire authentifié",
            Self::IdentityDocument => "Pièce d'identité vérifiée",
        }
    }
}

/// Everything the proof generator is given.
#[derive(Clone, Debug)]
pub struct ProofRequest<'a> {
    pub document_type: &'a str,
    pub document_id: LeaseId,
    pub document_content: &'a [u8],
    pub signer_name: &'a str,
    pub signer_email: &'a str,
    pub signer_profile_id: ProfileId,
    pub identity_verified: bool,
    pub identity_method: IdentityMethod,
    pub signature_type: &'a str,
    pub signature_artifact: &'a [u8],
    pub user_agent: Option<&'a str>,
    pub ip_address: Option<&'a str>,
    pub device: &'a BTreeMap<String, String>,
}

/// Opaque proof returned by the proof generator. Only `proof_id` and
/// `document_hash` are kept on the signer row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub proof_id: String,
    pub timestamp: DateTime<Utc>,
    pub document_hash: String,
    pub signature_hash: String,
    pub identity_verified: bool,
    pub identity_method: IdentityMethod,
}

// =============================================================================
// Document
// =============================================================================

/// Roster entry of the signed document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DocumentParty {
    pub role: SignerRole,
    pub name: Option<String>,
}

/// Canonical content hashed by the proof generator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LeaseDocument {
    pub lease_id: LeaseId,
    pub property_id: PropertyId,
    pub property_address: String,
    pub parties: Vec<DocumentParty>,
}

impl LeaseDocument {
    /// Build from the lease and its roster. Parties are sorted so the bytes
    /// do not depend on store ordering.
    pub fn new(lease: &LeaseSummary, signers: &[Signer]) -> Self {
        let mut parties: Vec<DocumentParty> = signers
            .iter()
            .map(|s| DocumentParty {
                role: s.role,
                name: s.invited_name.clone(),
            })
            .collect();
        parties.sort_by(|a, b| {
            (a.role.as_str(), a.name.as_deref()).cmp(&(b.role.as_str(), b.name.as_deref()))
        });
        Self {
            lease_id: lease.id,
            property_id: lease.property_id,
            property_address: lease.property_address.clone(),
            parties,
        }
    }

    pub fn canonical_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(first: Option<&str>, last: Option<&str>, email: Option<&str>) -> Profile {
        Profile {
            id: ProfileId::new(),
            first_name: first.map(str::to_string),
            last_name: last.map(str::to_string),
            email: email.map(str::to_string),
            identity_document_on_file: false,
        }
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(
            profile(Some("Jeanne"), Some("Dupont"), None).display_name(),
            "Jeanne Dupont"
        );
        assert_eq!(
            profile(None, Some(" "), Some("j@x.fr")).display_name(),
            "j@x.fr"
        );
        assert_eq!(profile(None, None, None).display_name(), "Utilisateur");
    }

    #[test]
    fn test_invitation_email_match_is_case_insensitive() {
        let signer = Signer::invited(LeaseId::new(), SignerRole::PrincipalTenant, "A@X.com", None);
        assert!(signer.is_invited_as(" a@x.com"));
        assert!(!signer.is_invited_as("b@x.com"));
    }

    #[test]
    fn test_identity_method_by_role() {
        assert_eq!(
            IdentityMethod::for_signer(SignerRole::Owner, false),
            (true, IdentityMethod::OwnerAccount)
        );
        assert_eq!(
            IdentityMethod::for_signer(SignerRole::PrincipalTenant, false),
            (true, IdentityMethod::AccountPossession)
        );
        assert_eq!(
            IdentityMethod::for_signer(SignerRole::CoTenant, true),
            (true, IdentityMethod::IdentityDocument)
        );
    }

    #[test]
    fn test_document_bytes_independent_of_row_order() {
        let lease = LeaseSummary {
            id: LeaseId::new(),
            status: LeaseStatus::PendingSignature,
            property_id: PropertyId::new(),
            property_address: "3 place Bellecour, Lyon".to_string(),
            owner_profile_id: None,
        };
        let a = Signer::placeholder(lease.id, SignerRole::Owner);
        let b = Signer::invited(lease.id, SignerRole::PrincipalTenant, "t@x.fr", Some("Tom"));

        let forward = LeaseDocument::new(&lease, &[a.clone(), b.clone()]);
        let reverse = LeaseDocument::new(&lease, &[b, a]);
        assert_eq!(
            forward.canonical_bytes().unwrap(),
            reverse.canonical_bytes().unwrap()
        );
    }

    #[test]
    fn test_artifact_extension() {
        assert_eq!(SignatureArtifact::extension_for("image/png"), "png");
        assert_eq!(SignatureArtifact::extension_for("image/jpeg"), "jpg");
        assert_eq!(SignatureArtifact::extension_for("image/svg+xml"), "svg");
        assert_eq!(SignatureArtifact::extension_for("image/gif"), "png");
    }
}
