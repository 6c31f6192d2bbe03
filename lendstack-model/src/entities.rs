//! Concrete entity records.
//!
//! Schemas carry only what the administration flows read and write; business
//! validation lives with the callers.

use crate::record::Record;
use lendstack_types::{EntityKind, RecordId, Timestamps};
use serde::{Deserialize, Serialize};

macro_rules! impl_record {
    ($ty:ty, $kind:expr) => {
        impl Record for $ty {
            const KIND: EntityKind = $kind;

            fn id(&self) -> RecordId {
                self.id
            }

            fn set_id(&mut self, id: RecordId) {
                self.id = id;
            }

            fn timestamps(&self) -> &Timestamps {
                &self.timestamps
            }

            fn timestamps_mut(&mut self) -> &mut Timestamps {
                &mut self.timestamps
            }
        }
    };
}

// ── Enquiry ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnquiryStatus {
    #[default]
    New,
    Contacted,
    InProgress,
    Approved,
    Rejected,
}

/// A loan enquiry submitted by a prospective borrower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enquiry {
    pub id: RecordId,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub loan_type: String,
    pub loan_amount: f64,
    #[serde(default)]
    pub status: EnquiryStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<RecordId>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl_record!(Enquiry, EntityKind::Enquiry);

// ── Document ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    #[default]
    Pending,
    Verified,
    Rejected,
}

/// A supporting document attached to an enquiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: RecordId,
    pub enquiry_id: RecordId,
    pub file_name: String,
    pub document_type: String,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default)]
    pub verified_by: Option<RecordId>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl_record!(Document, EntityKind::Document);

// ── Staff ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Admin,
    Manager,
    #[default]
    Officer,
}

/// A staff account.
///
/// `password` is kept locally for sign-in and is never mirrored remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: StaffRole,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl_record!(Staff, EntityKind::Staff);

fn default_true() -> bool {
    true
}

// ── Transaction ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Disbursement,
    Repayment,
    Fee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

/// A payment movement tied to an enquiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: RecordId,
    pub enquiry_id: RecordId,
    pub amount: f64,
    pub kind: TransactionKind,
    #[serde(default)]
    pub status: TransactionStatus,
    pub reference: String,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl_record!(Transaction, EntityKind::Transaction);

// ── Notification ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    #[default]
    Email,
    Sms,
    InApp,
}

/// An outbound notification queued for a recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: RecordId,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub channel: NotificationChannel,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub related_enquiry: Option<RecordId>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl_record!(Notification, EntityKind::Notification);

impl Notification {
    /// The notification raised when a new enquiry arrives.
    pub fn for_new_enquiry(enquiry: &Enquiry) -> Self {
        Self {
            id: RecordId::default(),
            recipient: enquiry.email.clone(),
            subject: "We received your loan enquiry".to_string(),
            body: format!(
                "Hello {}, thank you for your {} enquiry of {:.2}. Our team will contact you shortly.",
                enquiry.full_name, enquiry.loan_type, enquiry.loan_amount
            ),
            channel: NotificationChannel::Email,
            read: false,
            related_enquiry: Some(enquiry.id),
            timestamps: Timestamps::now(),
        }
    }
}
