use annot_archive::{ArchiveBuilder, ArchiveConfig, ArchiveError, KdfSettings};
use annot_blobstore::MemoryBlobStore;
use annot_cli::{LocalWorkspace, BLOB_DIR, CATALOG_FILE};
use annot_types::{BlobVariant, Label, ProjectId, Rule};
use pretty_assertions::assert_eq;
use std::path::Path;

fn fast_config() -> ArchiveConfig {
    ArchiveConfig {
        kdf: KdfSettings {
            memory_cost_kib: 1024,
            time_cost: 1,
            parallelism: 1,
        },
        compression_level: Some(1),
    }
}

fn write_file(dir: &Path, name: &str, data: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}

#[tokio::test]
async fn catalog_and_blobs_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let inbox = tempfile::tempdir().unwrap();
    let file = write_file(inbox.path(), "memo.txt", b"hello");

    {
        let mut ws = LocalWorkspace::open(dir.path()).unwrap();
        let project = ws.create_project("Memos").unwrap();
        assert_eq!(project.id, ProjectId(1));
        let first = ws.add_file(project.id, &file).await.unwrap();
        let second = ws.add_file(project.id, &file).await.unwrap();
        assert_eq!(first.name, "memo.txt");
        assert_eq!(second.name, "memo (1).txt");
        assert_eq!(second.size, 5);
        ws.save().unwrap();
    }

    assert!(dir.path().join(CATALOG_FILE).exists());
    let ws = LocalWorkspace::open(dir.path()).unwrap();
    assert_eq!(ws.catalog().projects.len(), 1);
    assert_eq!(ws.catalog().documents.len(), 2);

    let document = &ws.catalog().documents[0];
    let sid = document.storage_id.as_ref().unwrap();
    assert_eq!(
        ws.storage().get(sid, ".txt", BlobVariant::Original).await.unwrap(),
        b"hello"
    );
    assert!(dir
        .path()
        .join(BLOB_DIR)
        .join(sid.as_str())
        .join("original.txt")
        .exists());
}

#[tokio::test]
async fn sealed_project_moves_between_workspaces() {
    let config = fast_config();
    let inbox = tempfile::tempdir().unwrap();
    let report = write_file(inbox.path(), "report.pdf", b"%PDF-1.7 body");

    let source_dir = tempfile::tempdir().unwrap();
    let mut source = LocalWorkspace::open(source_dir.path()).unwrap();
    let project = source.create_project("Audit").unwrap();
    source.add_file(project.id, &report).await.unwrap();
    let archive = source
        .export_project(project.id, &config, Some("pw"))
        .await
        .unwrap();
    assert!(archive.sealed);
    assert!(archive.report.is_complete());
    assert_eq!(archive.suggested_file_name, "Audit.annproj");
    let bytes = archive.bytes;

    let target_dir = tempfile::tempdir().unwrap();
    let mut target = LocalWorkspace::open(target_dir.path()).unwrap();
    let existing = target.create_project("Audit").unwrap();
    target.add_file(existing.id, &report).await.unwrap();

    let err = target.import_project(&bytes, Some("wrong")).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ArchiveError>(),
        Some(ArchiveError::Decryption(_))
    ));
    assert_eq!(target.catalog().projects.len(), 1);

    let imported = target.import_project(&bytes, Some("pw")).await.unwrap();
    assert_eq!(imported.project.name, "Audit (1)");
    assert_eq!(imported.project.id, ProjectId(2));
    assert_eq!(imported.documents[0].name, "report (1).pdf");
    assert_eq!(target.catalog().projects.len(), 2);
    assert_eq!(target.catalog().documents.len(), 2);

    let sid = imported.documents[0].storage_id.as_ref().unwrap();
    assert_eq!(
        target.storage().get(sid, ".pdf", BlobVariant::Original).await.unwrap(),
        b"%PDF-1.7 body"
    );
}

#[tokio::test]
async fn labels_and_rules_archives_merge_into_project() {
    let config = fast_config();
    let scratch = MemoryBlobStore::new();
    let builder = ArchiveBuilder::new(&scratch, &config);

    let dir = tempfile::tempdir().unwrap();
    let mut ws = LocalWorkspace::open(dir.path()).unwrap();
    let project = ws.create_project("Labels").unwrap();

    let labels = builder
        .export_labels(&[Label::new("PERSON"), Label::new("ORG")], None)
        .await
        .unwrap();
    assert_eq!(ws.import_labels(&labels.bytes, None, project.id).unwrap(), 2);
    assert_eq!(ws.import_labels(&labels.bytes, None, project.id).unwrap(), 0);

    let other = ws.create_project("Source").unwrap();
    let rules = ws.export_rules(other.id, &config, None).await.unwrap();
    assert_eq!(ws.import_rules(&rules.bytes, None, project.id).unwrap(), 0);

    let project = ws.project(project.id).unwrap();
    let names: Vec<&str> = project.labels.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["PERSON", "ORG"]);
    assert!(project.rules.is_empty());
}

#[tokio::test]
async fn document_import_keeps_project_labels_unchanged() {
    let config = fast_config();
    let scratch = MemoryBlobStore::new();
    let builder = ArchiveBuilder::new(&scratch, &config);

    let dir = tempfile::tempdir().unwrap();
    let mut ws = LocalWorkspace::open(dir.path()).unwrap();
    let project = ws.create_project("Target").unwrap();
    let labels = builder
        .export_labels(&[Label::new("PERSON")], None)
        .await
        .unwrap();
    ws.import_labels(&labels.bytes, None, project.id).unwrap();

    let inbox = tempfile::tempdir().unwrap();
    let file = write_file(inbox.path(), "note.md", b"# note");
    let source = ws.create_project("Source").unwrap();
    let document = ws.add_file(source.id, &file).await.unwrap();

    let exported = builder
        .export_document(
            &document,
            &[Label::new("ORG"), Label::new("DATE"), Label::new("ORG")],
            &[Rule::new("iban")],
            None,
        )
        .await
        .unwrap();
    // Blobs live in the workspace, not the scratch store.
    assert_eq!(exported.report.missing_originals, vec![document.id]);

    let merged = ws
        .import_document(&exported.bytes, None, project.id)
        .await
        .unwrap();
    assert_eq!(merged.labels_added, 2);
    assert_eq!(merged.rules_added, 1);
    assert_eq!(merged.document.project_id, project.id);
    assert_eq!(merged.document.name, "note.md");
    assert_eq!(
        merged.document.labels,
        vec![Label::new("ORG"), Label::new("DATE")]
    );

    let target = ws.project(project.id).unwrap();
    assert_eq!(target.labels, vec![Label::new("PERSON")]);
    assert!(target.rules.is_empty());
    let stored = ws.document(merged.document.id).unwrap();
    assert_eq!(stored.rules, vec![Rule::new("iban")]);

    // Re-exporting the imported document carries its own labels only.
    let again = ws
        .export_document(merged.document.id, &config, None)
        .await
        .unwrap();
    let other = ws.create_project("Other").unwrap();
    let copy = ws.import_document(&again.bytes, None, other.id).await.unwrap();
    assert_eq!(copy.document.labels, vec![Label::new("ORG"), Label::new("DATE")]);
    assert!(ws.project(other.id).unwrap().labels.is_empty());
}

#[tokio::test]
async fn unknown_ids_are_errors() {
    let config = fast_config();
    let dir = tempfile::tempdir().unwrap();
    let ws = LocalWorkspace::open(dir.path()).unwrap();
    assert!(ws.export_project(ProjectId(9), &config, None).await.is_err());
    assert!(ws.project(ProjectId(1)).is_err());
}
