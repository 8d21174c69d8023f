use annot_types::{
    BlobVariant, Document, DocumentId, DocumentStatus, Label, ProjectId, StorageId,
};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::str::FromStr;

fn sample_document() -> Document {
    Document {
        id: DocumentId(5),
        project_id: ProjectId(2),
        name: "contract.final.pdf".to_string(),
        status: DocumentStatus::Annotated,
        storage_id: Some(StorageId::new("s-1")),
        token_count: 1200,
        size: 4096,
        date: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        labels: Vec::new(),
        rules: Vec::new(),
    }
}

// ── Status ────────────────────────────────────────────────────────

#[test]
fn processed_states_expect_annotated_output() {
    assert!(DocumentStatus::Processed.has_annotated_output());
    assert!(DocumentStatus::Review.has_annotated_output());
    assert!(DocumentStatus::Annotated.has_annotated_output());
    assert!(!DocumentStatus::Ready.has_annotated_output());
    assert!(!DocumentStatus::InProgress.has_annotated_output());
    assert!(!DocumentStatus::Error.has_annotated_output());
}

#[test]
fn in_progress_uses_spaced_name_and_accepts_alias() {
    assert_eq!(
        serde_json::to_string(&DocumentStatus::InProgress).unwrap(),
        "\"In Progress\""
    );
    let aliased: DocumentStatus = serde_json::from_str("\"Processing\"").unwrap();
    assert_eq!(aliased, DocumentStatus::InProgress);
}

#[test]
fn status_from_str() {
    assert_eq!(DocumentStatus::from_str("Review").unwrap(), DocumentStatus::Review);
    assert!(DocumentStatus::from_str("Archived").is_err());
}

#[test]
fn unknown_status_is_rejected_by_serde() {
    assert!(serde_json::from_str::<DocumentStatus>("\"Done\"").is_err());
}

// ── Document ──────────────────────────────────────────────────────

#[test]
fn document_extension_from_last_dot() {
    assert_eq!(sample_document().extension(), ".pdf");
}

#[test]
fn document_json_uses_camel_case() {
    let value = serde_json::to_value(sample_document()).unwrap();
    assert_eq!(value["projectId"], json!(2));
    assert_eq!(value["storageId"], json!("s-1"));
    assert_eq!(value["tokenCount"], json!(1200));
}

#[test]
fn document_without_storage_id_parses() {
    let doc: Document = serde_json::from_value(json!({
        "id": 1,
        "projectId": 1,
        "name": "notes.txt",
        "status": "Ready",
        "date": "2024-01-01T00:00:00Z"
    }))
    .unwrap();
    assert!(doc.storage_id.is_none());
    assert_eq!(doc.token_count, 0);
    assert!(doc.labels.is_empty());
}

#[test]
fn scoped_labels_are_written_only_when_present() {
    let mut document = sample_document();
    let value = serde_json::to_value(&document).unwrap();
    assert!(value.get("labels").is_none());
    assert!(value.get("rules").is_none());

    document.labels.push(Label::new("CASE_NO"));
    let value = serde_json::to_value(&document).unwrap();
    assert_eq!(value["labels"][0]["name"], json!("CASE_NO"));
    let back: Document = serde_json::from_value(value).unwrap();
    assert_eq!(back, document);
}

#[test]
fn document_missing_name_is_rejected() {
    let result = serde_json::from_value::<Document>(json!({
        "id": 1,
        "projectId": 1,
        "status": "Ready",
        "date": "2024-01-01T00:00:00Z"
    }));
    assert!(result.is_err());
}

#[test]
fn blob_variant_names() {
    assert_eq!(BlobVariant::Original.as_str(), "original");
    assert_eq!(BlobVariant::Annotated.to_string(), "annotated");
    assert_eq!(BlobVariant::ALL.len(), 2);
}
