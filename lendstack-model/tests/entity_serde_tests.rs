use lendstack_model::{
    Enquiry, EnquiryStatus, Notification, NotificationChannel, Staff, StaffRole, Transaction,
    TransactionKind, seed,
};
use lendstack_types::RecordId;
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn enquiry_uses_camel_case_keys_and_snake_case_status() {
    let enquiry = seed::enquiries().remove(0);
    let json = serde_json::to_value(&enquiry).unwrap();

    assert_eq!(json["fullName"], json!("Amelia Hart"));
    assert_eq!(json["loanAmount"], json!(250_000.0));
    assert_eq!(json["status"], json!("in_progress"));
    assert_eq!(json["assignedTo"], json!(2));
    assert!(json.get("createdAt").is_some());
    assert!(json.get("timestamps").is_none());
}

#[test]
fn optional_fields_default_when_absent() {
    let enquiry: Enquiry = serde_json::from_value(json!({
        "id": 4,
        "fullName": "Sam",
        "email": "sam@example.com",
        "loanType": "bridging",
        "loanAmount": 1.0,
        "createdAt": "2024-02-01T10:00:00Z",
        "updatedAt": "2024-02-01T10:00:00Z"
    }))
    .unwrap();

    assert_eq!(enquiry.status, EnquiryStatus::New);
    assert_eq!(enquiry.phone, None);
    assert_eq!(enquiry.assigned_to, None);
}

#[test]
fn staff_password_is_omitted_when_unset() {
    let mut staff = seed::staff().remove(1);
    let json = serde_json::to_value(&staff).unwrap();
    assert!(json.get("password").is_none());
    assert_eq!(json["role"], json!("manager"));

    staff.password = Some("hunter2".to_string());
    let json = serde_json::to_value(&staff).unwrap();
    assert_eq!(json["password"], json!("hunter2"));
}

#[test]
fn staff_defaults_to_active_officer() {
    let staff: Staff = serde_json::from_value(json!({
        "id": 9,
        "name": "New Hire",
        "email": "new@example.com",
        "createdAt": "2024-02-01T10:00:00Z",
        "updatedAt": "2024-02-01T10:00:00Z"
    }))
    .unwrap();
    assert!(staff.active);
    assert_eq!(staff.role, StaffRole::Officer);
}

#[test]
fn transaction_requires_kind() {
    let result: Result<Transaction, _> = serde_json::from_value(json!({
        "id": 1,
        "enquiryId": 1,
        "amount": 10.0,
        "reference": "X",
        "createdAt": "2024-02-01T10:00:00Z",
        "updatedAt": "2024-02-01T10:00:00Z"
    }));
    assert!(result.is_err());

    let fee = seed::transactions().remove(1);
    assert_eq!(fee.kind, TransactionKind::Fee);
}

#[test]
fn new_enquiry_notification_addresses_the_borrower() {
    let enquiry = seed::enquiries().remove(1);
    let notice = Notification::for_new_enquiry(&enquiry);

    assert_eq!(notice.recipient, "rohan.mehta@example.com");
    assert_eq!(notice.channel, NotificationChannel::Email);
    assert_eq!(notice.related_enquiry, Some(RecordId::new(2)));
    assert!(!notice.read);
    assert!(notice.body.contains("Rohan Mehta"));
}

#[test]
fn seed_ids_are_unique_per_type() {
    fn unique(ids: Vec<u64>) -> bool {
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        sorted.len() == ids.len()
    }

    assert!(unique(seed::enquiries().iter().map(|r| r.id.get()).collect()));
    assert!(unique(seed::documents().iter().map(|r| r.id.get()).collect()));
    assert!(unique(seed::staff().iter().map(|r| r.id.get()).collect()));
    assert!(unique(seed::transactions().iter().map(|r| r.id.get()).collect()));
    assert!(unique(seed::notifications().iter().map(|r| r.id.get()).collect()));
    assert!(seed::SYSTEM_STAFF_IDS.iter().all(|id| seed::staff().iter().any(|s| s.id.get() == *id)));
}
