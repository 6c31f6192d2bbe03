//! Fixed sample records loaded into empty repositories.
//!
//! Ids and timestamps are constant so that a cold start always produces the
//! same data set for demos and tests.

use crate::entities::{
    Document, DocumentStatus, Enquiry, EnquiryStatus, Notification, NotificationChannel, Staff,
    StaffRole, Transaction, TransactionKind, TransactionStatus,
};
use chrono::{TimeZone, Utc};
use lendstack_types::{RecordId, Timestamps};

/// Staff ids that represent system accounts and are never cleared remotely.
pub const SYSTEM_STAFF_IDS: &[u64] = &[1];

fn at(unix_secs: i64) -> Timestamps {
    Timestamps::at(Utc.timestamp_opt(unix_secs, 0).single().unwrap_or_default())
}

pub fn enquiries() -> Vec<Enquiry> {
    vec![
        Enquiry {
            id: RecordId::new(1),
            full_name: "Amelia Hart".to_string(),
            email: "amelia.hart@example.com".to_string(),
            phone: Some("+44 7700 900123".to_string()),
            loan_type: "bridging".to_string(),
            loan_amount: 250_000.0,
            status: EnquiryStatus::InProgress,
            message: Some("Looking to bridge a property purchase for 9 months.".to_string()),
            assigned_to: Some(RecordId::new(2)),
            timestamps: at(1_704_877_200),
        },
        Enquiry {
            id: RecordId::new(2),
            full_name: "Rohan Mehta".to_string(),
            email: "rohan.mehta@example.com".to_string(),
            phone: None,
            loan_type: "commercial".to_string(),
            loan_amount: 1_200_000.0,
            status: EnquiryStatus::New,
            message: None,
            assigned_to: None,
            timestamps: at(1_705_050_000),
        },
        Enquiry {
            id: RecordId::new(3),
            full_name: "Grace Okafor".to_string(),
            email: "grace.okafor@example.com".to_string(),
            phone: Some("+44 7700 900456".to_string()),
            loan_type: "development".to_string(),
            loan_amount: 640_000.0,
            status: EnquiryStatus::Approved,
            message: Some("Ground-up build of four units.".to_string()),
            assigned_to: Some(RecordId::new(3)),
            timestamps: at(1_705_222_800),
        },
    ]
}

pub fn documents() -> Vec<Document> {
    vec![
        Document {
            id: RecordId::new(1),
            enquiry_id: RecordId::new(1),
            file_name: "proof-of-id.pdf".to_string(),
            document_type: "identity".to_string(),
            status: DocumentStatus::Verified,
            verified_by: Some(RecordId::new(2)),
            notes: None,
            timestamps: at(1_704_963_600),
        },
        Document {
            id: RecordId::new(2),
            enquiry_id: RecordId::new(1),
            file_name: "valuation-report.pdf".to_string(),
            document_type: "valuation".to_string(),
            status: DocumentStatus::Pending,
            verified_by: None,
            notes: Some("Awaiting surveyor signature".to_string()),
            timestamps: at(1_705_136_400),
        },
    ]
}

pub fn staff() -> Vec<Staff> {
    vec![
        Staff {
            id: RecordId::new(1),
            name: "System Administrator".to_string(),
            email: "admin@lendstack.local".to_string(),
            role: StaffRole::Admin,
            active: true,
            password: None,
            timestamps: at(1_704_067_200),
        },
        Staff {
            id: RecordId::new(2),
            name: "Priya Nair".to_string(),
            email: "priya.nair@lendstack.local".to_string(),
            role: StaffRole::Manager,
            active: true,
            password: None,
            timestamps: at(1_704_153_600),
        },
        Staff {
            id: RecordId::new(3),
            name: "Tom Becker".to_string(),
            email: "tom.becker@lendstack.local".to_string(),
            role: StaffRole::Officer,
            active: true,
            password: None,
            timestamps: at(1_704_240_000),
        },
    ]
}

pub fn transactions() -> Vec<Transaction> {
    vec![
        Transaction {
            id: RecordId::new(1),
            enquiry_id: RecordId::new(3),
            amount: 640_000.0,
            kind: TransactionKind::Disbursement,
            status: TransactionStatus::Completed,
            reference: "DSB-2024-0001".to_string(),
            timestamps: at(1_705_395_600),
        },
        Transaction {
            id: RecordId::new(2),
            enquiry_id: RecordId::new(3),
            amount: 3_200.0,
            kind: TransactionKind::Fee,
            status: TransactionStatus::Pending,
            reference: "FEE-2024-0001".to_string(),
            timestamps: at(1_705_395_660),
        },
    ]
}

pub fn notifications() -> Vec<Notification> {
    vec![Notification {
        id: RecordId::new(1),
        recipient: "amelia.hart@example.com".to_string(),
        subject: "We received your loan enquiry".to_string(),
        body: "Hello Amelia Hart, thank you for your bridging enquiry.".to_string(),
        channel: NotificationChannel::Email,
        read: true,
        related_enquiry: Some(RecordId::new(1)),
        timestamps: at(1_704_877_260),
    }]
}
