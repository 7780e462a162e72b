//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Identifiers**: `LeaseId`, `SignerId`, `ProfileId`, `PropertyId`
//! - **Signatories**: `SignerRole`, `SignatureStatus`
//! - **Lease lifecycle**: `LeaseStatus`

use crate::errors::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// =============================================================================
// CLUSTER A: IDENTIFIERS
// =============================================================================

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// The underlying UUID.
            #[must_use]
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|e| ParseError::InvalidId {
                        value: s.to_string(),
                        reason: e.to_string(),
                    })
            }
        }
    };
}

define_id!(
    /// Identifier of a lease (bail).
    LeaseId
);
define_id!(
    /// Identifier of a signer row attached to a lease.
    SignerId
);
define_id!(
    /// Identifier of a user profile, the identity a signer row binds to.
    ProfileId
);
define_id!(
    /// Identifier of the rented property.
    PropertyId
);

/// Lowercase, strip French accents, and fold separators to `_`.
fn normalize_key(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            'é' | 'è' | 'ê' | 'ë' | 'É' | 'È' | 'Ê' => 'e',
            'à' | 'â' | 'À' | 'Â' => 'a',
            'ô' | 'Ô' => 'o',
            'î' | 'ï' => 'i',
            'ù' | 'û' => 'u',
            'ç' => 'c',
            '-' | ' ' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

// =============================================================================
// CLUSTER B: SIGNATORIES
// =============================================================================

/// Role of a signatory on a lease.
///
/// Historical rows mix French and English spellings (`proprietaire`,
/// `owner`, `bailleur`, `locataire_principal`, `colocataire`, ...). They are
/// folded into this enum by [`SignerRole::normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignerRole {
    /// Owner / landlord / lessor.
    Owner,
    /// Principal tenant.
    PrincipalTenant,
    /// Co-tenant (colocataire).
    CoTenant,
    /// Guarantor (garant). Signs, but is neither owner- nor tenant-family.
    Guarantor,
}

impl SignerRole {
    /// Map any known spelling onto a role. Returns `None` for unknown input.
    #[must_use]
    pub fn normalize(raw: &str) -> Option<Self> {
        match normalize_key(raw).as_str() {
            "owner" | "proprietaire" | "bailleur" | "landlord" | "lessor" => Some(Self::Owner),
            "tenant" | "locataire" | "locataire_principal" | "principal_tenant"
            | "main_tenant" => Some(Self::PrincipalTenant),
            "colocataire" | "co_locataire" | "co_tenant" | "cotenant" => Some(Self::CoTenant),
            "garant" | "guarantor" | "caution" => Some(Self::Guarantor),
            _ => None,
        }
    }

    /// Owner, landlord or lessor.
    #[must_use]
    pub fn is_owner_family(self) -> bool {
        matches!(self, Self::Owner)
    }

    /// Principal tenant or co-tenant.
    #[must_use]
    pub fn is_tenant_family(self) -> bool {
        matches!(self, Self::PrincipalTenant | Self::CoTenant)
    }

    /// Canonical storage spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "proprietaire",
            Self::PrincipalTenant => "locataire_principal",
            Self::CoTenant => "colocataire",
            Self::Guarantor => "garant",
        }
    }
}

impl fmt::Display for SignerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignerRole {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s).ok_or_else(|| ParseError::UnknownRole(s.to_string()))
    }
}

/// Signature state of a signer row. Only ever moves `Pending -> Signed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SignatureStatus {
    #[default]
    Pending,
    Signed,
}

impl SignatureStatus {
    #[must_use]
    pub fn is_signed(self) -> bool {
        matches!(self, Self::Signed)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Signed => "signed",
        }
    }
}

impl FromStr for SignatureStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_key(s).as_str() {
            "pending" | "en_attente" => Ok(Self::Pending),
            "signed" | "signe" => Ok(Self::Signed),
            _ => Err(ParseError::UnknownSignatureStatus(s.to_string())),
        }
    }
}

// =============================================================================
// CLUSTER C: LEASE LIFECYCLE
// =============================================================================

/// Overall status of a lease.
///
/// The signature core only produces `Draft`, `PendingSignature` and
/// `FullySigned`. The remaining states are owned by the lease-management
/// flows and are never overwritten by a signature recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LeaseStatus {
    #[default]
    Draft,
    PendingSignature,
    FullySigned,
    Active,
    Terminated,
    Archived,
}

impl LeaseStatus {
    /// The lease moved past the signature phase (active, terminated, archived).
    #[must_use]
    pub fn is_lifecycle_advanced(self) -> bool {
        matches!(self, Self::Active | Self::Terminated | Self::Archived)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingSignature => "pending_signature",
            Self::FullySigned => "fully_signed",
            Self::Active => "active",
            Self::Terminated => "terminated",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for LeaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeaseStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_key(s).as_str() {
            "draft" | "brouillon" => Ok(Self::Draft),
            "pending_signature" | "en_attente_signature" => Ok(Self::PendingSignature),
            "fully_signed" | "signe" => Ok(Self::FullySigned),
            "active" | "actif" => Ok(Self::Active),
            "terminated" | "resilie" => Ok(Self::Terminated),
            "archived" | "archive" => Ok(Self::Archived),
            _ => Err(ParseError::UnknownLeaseStatus(s.to_string())),
        }
    }
}
