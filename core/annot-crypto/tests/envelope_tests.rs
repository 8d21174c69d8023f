use annot_crypto::{
    is_sealed, open, seal, CryptoError, KdfParams, ENVELOPE_HEADER_LEN, ENVELOPE_MAGIC, TAG_SIZE,
};

fn fast_kdf_params() -> KdfParams {
    KdfParams {
        memory_cost: 1024,
        time_cost: 1,
        parallelism: 1,
    }
}

// ── seal / open ───────────────────────────────────────────────────

#[test]
fn seal_open_roundtrip() {
    let sealed = seal(b"container bytes", "hunter2", &fast_kdf_params()).unwrap();
    let opened = open(&sealed, "hunter2").unwrap();
    assert_eq!(opened, b"container bytes");
}

#[test]
fn sealed_output_starts_with_magic_not_zip_signature() {
    let sealed = seal(b"PK\x03\x04 payload", "pw", &fast_kdf_params()).unwrap();
    assert!(sealed.starts_with(&ENVELOPE_MAGIC));
    assert_ne!(&sealed[..2], b"PK");
    assert!(is_sealed(&sealed));
}

#[test]
fn sealed_length_is_header_plus_tag_plus_payload() {
    let sealed = seal(&[1u8; 100], "pw", &fast_kdf_params()).unwrap();
    assert_eq!(sealed.len(), ENVELOPE_HEADER_LEN + TAG_SIZE + 100);
}

#[test]
fn same_input_seals_differently() {
    let a = seal(b"same", "pw", &fast_kdf_params()).unwrap();
    let b = seal(b"same", "pw", &fast_kdf_params()).unwrap();
    assert_ne!(a, b);
}

#[test]
fn empty_password_cannot_seal() {
    let err = seal(b"data", "", &fast_kdf_params()).unwrap_err();
    assert!(matches!(err, CryptoError::EmptyPassword));
}

// ── failure classification ────────────────────────────────────────

#[test]
fn wrong_password_is_decryption_error() {
    let sealed = seal(b"secret", "right", &fast_kdf_params()).unwrap();
    let err = open(&sealed, "wrong").unwrap_err();
    assert!(matches!(err, CryptoError::Decryption(_)));
}

#[test]
fn empty_password_on_open_is_decryption_error() {
    let sealed = seal(b"secret", "right", &fast_kdf_params()).unwrap();
    assert!(matches!(open(&sealed, ""), Err(CryptoError::Decryption(_))));
}

#[test]
fn tampered_ciphertext_is_decryption_error() {
    let mut sealed = seal(b"secret payload", "pw", &fast_kdf_params()).unwrap();
    let last = sealed.len() - 1;
    sealed[last] ^= 0x01;
    assert!(matches!(open(&sealed, "pw"), Err(CryptoError::Decryption(_))));
}

#[test]
fn tampered_salt_is_decryption_error() {
    let mut sealed = seal(b"secret payload", "pw", &fast_kdf_params()).unwrap();
    sealed[20] ^= 0xFF;
    assert!(matches!(open(&sealed, "pw"), Err(CryptoError::Decryption(_))));
}

#[test]
fn plain_bytes_are_invalid_envelope() {
    let err = open(b"PK\x03\x04not sealed at all", "pw").unwrap_err();
    assert!(matches!(err, CryptoError::InvalidEnvelope(_)));
    assert!(!is_sealed(b"PK\x03\x04"));
}

#[test]
fn truncated_envelope_is_invalid() {
    let sealed = seal(b"x", "pw", &fast_kdf_params()).unwrap();
    let err = open(&sealed[..ENVELOPE_HEADER_LEN], "pw").unwrap_err();
    assert!(matches!(err, CryptoError::InvalidEnvelope(_)));
}

#[test]
fn unknown_version_is_invalid() {
    let mut sealed = seal(b"x", "pw", &fast_kdf_params()).unwrap();
    sealed[4] = 99;
    assert!(matches!(open(&sealed, "pw"), Err(CryptoError::InvalidEnvelope(_))));
}

#[test]
fn hostile_memory_cost_is_rejected_before_derivation() {
    let mut sealed = seal(b"x", "pw", &fast_kdf_params()).unwrap();
    sealed[5..9].copy_from_slice(&u32::MAX.to_le_bytes());
    assert!(matches!(open(&sealed, "pw"), Err(CryptoError::InvalidEnvelope(_))));
}

// ── Display ───────────────────────────────────────────────────────

#[test]
fn error_display() {
    assert!(CryptoError::EmptyPassword.to_string().contains("empty"));
    let err = CryptoError::Decryption("wrong password".into());
    assert!(err.to_string().contains("decryption failed"));
}
