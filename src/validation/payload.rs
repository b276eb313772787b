//! Insurance event payload
//!
//! The record embedded in every block. Text fields are bounded by the
//! fixed widths of the persisted block record.

use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

use crate::constants::{DIAGNOSIS_CAPACITY, ID_CAPACITY, NOTES_CAPACITY};

/// Bounded text errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("value is {len} bytes, field holds at most {max}")]
    TooLong { len: usize, max: usize },
    #[error("value contains a NUL byte")]
    InteriorNul,
}

/// Owned text with a maximum byte length of `CAP - 1`.
///
/// `CAP` is the width of the persisted field, terminator included. Bytes
/// are kept as stored so that ledgers written by other tools, whose text
/// need not be UTF-8, hash and round-trip unchanged.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct FixedText<const CAP: usize>(Vec<u8>);

impl<const CAP: usize> FixedText<CAP> {
    /// Longest value the field can hold
    pub const MAX_LEN: usize = CAP - 1;

    pub fn new(value: impl Into<String>) -> Result<Self, FieldError> {
        Self::from_bytes(value.into().into_bytes())
    }

    /// Raw field contents, as read from a ledger record
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, FieldError> {
        let bytes = bytes.into();
        if bytes.len() > Self::MAX_LEN {
            return Err(FieldError::TooLong {
                len: bytes.len(),
                max: Self::MAX_LEN,
            });
        }
        if bytes.contains(&0) {
            return Err(FieldError::InteriorNul);
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Text for display; invalid UTF-8 sequences become U+FFFD
    pub fn to_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<const CAP: usize> fmt::Debug for FixedText<CAP> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.to_text(), f)
    }
}

impl<const CAP: usize> fmt::Display for FixedText<CAP> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl<const CAP: usize> Serialize for FixedText<CAP> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_text())
    }
}

/// Policy, member and provider identifiers
pub type Identifier = FixedText<ID_CAPACITY>;
/// ICD-style diagnosis code, "N/A" when not applicable
pub type DiagnosisCode = FixedText<DIAGNOSIS_CAPACITY>;
/// Free-text notes
pub type Notes = FixedText<NOTES_CAPACITY>;

/// Insurance lifecycle event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Enrollment,
    PremiumPayment,
    PreauthRequest,
    ClaimSubmission,
    ClaimDecision,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::Enrollment,
        EventKind::PremiumPayment,
        EventKind::PreauthRequest,
        EventKind::ClaimSubmission,
        EventKind::ClaimDecision,
    ];

    /// Integer code used in the digest preimage and the block record
    pub fn code(self) -> i32 {
        match self {
            EventKind::Enrollment => 0,
            EventKind::PremiumPayment => 1,
            EventKind::PreauthRequest => 2,
            EventKind::ClaimSubmission => 3,
            EventKind::ClaimDecision => 4,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Canonical name
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Enrollment => "ENROLLMENT",
            EventKind::PremiumPayment => "PREMIUM_PAYMENT",
            EventKind::PreauthRequest => "PREAUTH_REQUEST",
            EventKind::ClaimSubmission => "CLAIM_SUBMISSION",
            EventKind::ClaimDecision => "CLAIM_DECISION",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The event data carried by a block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payload {
    pub policy_id: Identifier,
    pub member_id: Identifier,
    pub event_kind: EventKind,
    pub provider_id: Identifier,
    /// Monetary amount, validated to 0..=1,000,000.00 before it gets here
    pub amount: f64,
    pub diagnosis_code: DiagnosisCode,
    pub notes: Notes,
}

impl Payload {
    /// Payload with the given identity fields, zero amount and "N/A" diagnosis
    pub fn new(
        event_kind: EventKind,
        policy_id: Identifier,
        member_id: Identifier,
        provider_id: Identifier,
    ) -> Self {
        Self {
            policy_id,
            member_id,
            event_kind,
            provider_id,
            amount: 0.0,
            diagnosis_code: not_applicable(),
            notes: Notes::default(),
        }
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_diagnosis(mut self, code: DiagnosisCode) -> Self {
        self.diagnosis_code = code;
        self
    }

    pub fn with_notes(mut self, notes: Notes) -> Self {
        self.notes = notes;
        self
    }

    /// Amount in the two-decimal form used for hashing
    pub fn amount_text(&self) -> String {
        format!("{:.2}", self.amount)
    }
}

/// Diagnosis placeholder for events without one
pub fn not_applicable() -> DiagnosisCode {
    FixedText(b"N/A".to_vec())
}
