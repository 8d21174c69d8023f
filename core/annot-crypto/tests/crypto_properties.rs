//! Property-based tests for the password envelope.
//!
//! These hold for every payload and password:
//! - Sealing then opening with the same password returns the payload
//! - Opening with any other password fails with a decryption error
//! - Sealed output is never mistaken for a ZIP container

use annot_crypto::{open, seal, CryptoError, KdfParams};
use proptest::prelude::*;

fn fast_kdf_params() -> KdfParams {
    KdfParams {
        memory_cost: 1024,
        time_cost: 1,
        parallelism: 1,
    }
}

fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..4096)
}

fn password_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9!@#$%^&*()]{1,64}").unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn roundtrip_preserves_payload(payload in payload_strategy(), password in password_strategy()) {
        let sealed = seal(&payload, &password, &fast_kdf_params()).unwrap();
        let opened = open(&sealed, &password).unwrap();
        prop_assert_eq!(opened, payload);
    }

    #[test]
    fn wrong_password_never_yields_plaintext(
        payload in payload_strategy(),
        first in password_strategy(),
        second in password_strategy(),
    ) {
        prop_assume!(first != second);

        let sealed_first = seal(&payload, &first, &fast_kdf_params()).unwrap();
        let sealed_second = seal(&payload, &second, &fast_kdf_params()).unwrap();

        prop_assert!(matches!(open(&sealed_first, &second), Err(CryptoError::Decryption(_))));
        prop_assert!(matches!(open(&sealed_second, &first), Err(CryptoError::Decryption(_))));
    }

    #[test]
    fn sealed_never_starts_with_zip_signature(payload in payload_strategy()) {
        let sealed = seal(&payload, "pw", &fast_kdf_params()).unwrap();
        prop_assert_ne!(&sealed[..2], b"PK");
    }
}
