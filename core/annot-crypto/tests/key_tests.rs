use annot_crypto::{derive_key, CryptoError, DerivedKey, KdfParams, Salt, KEY_SIZE};

fn fast_kdf_params() -> KdfParams {
    KdfParams {
        memory_cost: 1024,
        time_cost: 1,
        parallelism: 1,
    }
}

#[test]
fn derivation_is_deterministic() {
    let salt = Salt::from_bytes([3u8; 16]);
    let a = derive_key("password", &salt, &fast_kdf_params()).unwrap();
    let b = derive_key("password", &salt, &fast_kdf_params()).unwrap();
    assert_eq!(a.as_bytes(), b.as_bytes());
}

#[test]
fn different_salts_give_different_keys() {
    let a = derive_key("password", &Salt::from_bytes([1u8; 16]), &fast_kdf_params()).unwrap();
    let b = derive_key("password", &Salt::from_bytes([2u8; 16]), &fast_kdf_params()).unwrap();
    assert_ne!(a.as_bytes(), b.as_bytes());
}

#[test]
fn different_params_give_different_keys() {
    let salt = Salt::random();
    let a = derive_key("password", &salt, &fast_kdf_params()).unwrap();
    let slower = KdfParams {
        time_cost: 2,
        ..fast_kdf_params()
    };
    let b = derive_key("password", &salt, &slower).unwrap();
    assert_ne!(a.as_bytes(), b.as_bytes());
}

#[test]
fn invalid_params_fail_derivation() {
    let params = KdfParams {
        parallelism: 0,
        ..fast_kdf_params()
    };
    let err = derive_key("password", &Salt::random(), &params).unwrap_err();
    assert!(matches!(err, CryptoError::KeyDerivation(_)));
}

#[test]
fn key_debug_is_redacted() {
    let key = DerivedKey::from_bytes([0xAB; KEY_SIZE]);
    let debug = format!("{key:?}");
    assert!(debug.contains("REDACTED"));
    assert!(!debug.contains("171"));
}
