use annot_archive::{
    build_container, dedup_name, is_container, unseal, ArchiveError, ArchiveKind, Container,
    ContainerBuilder, NameScope,
};
use annot_crypto::{seal, KdfParams};
use annot_types::file_extension;
use proptest::prelude::*;
use std::collections::{BTreeMap, HashSet};

fn name_strategy() -> impl Strategy<Value = String> {
    ("[a-z ]{1,8}", prop::option::of("[a-z]{1,4}")).prop_map(|(stem, ext)| match ext {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    })
}

fn fast_kdf_params() -> KdfParams {
    KdfParams {
        memory_cost: 1024,
        time_cost: 1,
        parallelism: 1,
    }
}

proptest! {
    #[test]
    fn unused_candidate_is_returned_unchanged(
        candidate in name_strategy(),
        used in prop::collection::hash_set(name_strategy(), 0..8),
    ) {
        prop_assume!(!used.contains(&candidate));
        prop_assert_eq!(dedup_name(&candidate, &used), candidate);
    }

    #[test]
    fn colliding_candidate_gets_fresh_name_with_same_extension(
        candidate in name_strategy(),
        others in prop::collection::hash_set(name_strategy(), 0..8),
    ) {
        let mut used: HashSet<String> = others;
        used.insert(candidate.clone());

        let result = dedup_name(&candidate, &used);
        prop_assert!(!used.contains(&result));
        prop_assert_eq!(file_extension(&result), file_extension(&candidate));
    }

    #[test]
    fn scope_never_hands_out_a_name_twice(
        candidates in prop::collection::vec(name_strategy(), 1..12),
    ) {
        let mut scope = NameScope::default();
        let mut seen = HashSet::new();
        for candidate in &candidates {
            prop_assert!(seen.insert(scope.claim(candidate)));
        }
    }

    #[test]
    fn container_round_trip(
        entries in prop::collection::btree_map(
            "[a-z]{1,6}(/[a-z]{1,6}){0,2}\\.[a-z]{1,3}",
            prop::collection::vec(any::<u8>(), 0..256),
            0..8,
        ),
    ) {
        let bytes = build_container(&entries).unwrap();
        prop_assert!(is_container(&bytes));
        let parsed = Container::parse(&bytes).unwrap();
        prop_assert_eq!(parsed.into_entries(), entries);
    }
}

#[test]
fn builder_rejects_duplicates_and_unsafe_paths() {
    let mut builder = ContainerBuilder::new();
    builder.add("a.json", b"{}".to_vec()).unwrap();
    assert!(matches!(
        builder.add("a.json", Vec::new()),
        Err(ArchiveError::DuplicateEntry(_))
    ));
    for bad in ["", "/etc/passwd", "../up.txt", "files/../../x", "win\\path"] {
        assert!(
            matches!(builder.add(bad, Vec::new()), Err(ArchiveError::InvalidPath(_))),
            "{bad:?}"
        );
    }
    assert!(builder.contains("a.json"));
    assert!(!builder.contains("../up.txt"));
}

#[test]
fn prefix_enumeration() {
    let mut entries = BTreeMap::new();
    for path in ["files/a_original.pdf", "files/b_original.txt", "project.json", "filesystem.txt"] {
        entries.insert(path.to_string(), path.as_bytes().to_vec());
    }
    let container = Container::parse(&build_container(&entries).unwrap()).unwrap();

    let under: Vec<&str> = container.entries_under("files/").map(|(p, _)| p).collect();
    assert_eq!(under, vec!["files/a_original.pdf", "files/b_original.txt"]);
    assert_eq!(container.entries_under("nothing/").count(), 0);
    assert_eq!(container.get("project.json"), Some(&b"project.json"[..]));
    assert!(container.get("files/").is_none());
}

#[test]
fn empty_container_is_still_a_container() {
    let bytes = ContainerBuilder::new().finish().unwrap();
    assert!(is_container(&bytes));
    let container = Container::parse(&bytes).unwrap();
    assert_eq!(container.paths().count(), 0);
    assert_eq!(ArchiveKind::detect(&container), None);
}

#[test]
fn unseal_distinguishes_plain_sealed_and_garbage() {
    let plain = build_container(&BTreeMap::new()).unwrap();
    assert_eq!(unseal(&plain, None).unwrap().as_ref(), plain.as_slice());
    assert_eq!(unseal(&plain, Some("ignored")).unwrap().as_ref(), plain.as_slice());

    let sealed = seal(&plain, "pw", &fast_kdf_params()).unwrap();
    assert!(!is_container(&sealed));
    assert!(matches!(unseal(&sealed, None), Err(ArchiveError::PasswordRequired)));
    assert!(matches!(unseal(&sealed, Some("nope")), Err(ArchiveError::Decryption(_))));
    assert_eq!(unseal(&sealed, Some("pw")).unwrap().as_ref(), plain.as_slice());

    assert!(matches!(unseal(b"%PDF-1.7", Some("pw")), Err(ArchiveError::Format(_))));
}

#[test]
fn kind_detection_prefers_richer_layouts() {
    let mut entries = BTreeMap::new();
    entries.insert("document.json".to_string(), b"{}".to_vec());
    entries.insert("labels.json".to_string(), b"[]".to_vec());
    let container = Container::parse(&build_container(&entries).unwrap()).unwrap();
    assert_eq!(ArchiveKind::detect(&container), Some(ArchiveKind::Document));
    assert!(ArchiveKind::Labels.require(&container).is_ok());
    assert!(ArchiveKind::Rules.require(&container).is_err());
}
