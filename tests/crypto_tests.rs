//! Integration tests for the passvault crypto module.

use passvault::crypto::{derive_key, generate_salt, open, seal, KdfParams};

/// Cheap Argon2 parameters so the test suite stays fast.
fn fast_params() -> KdfParams {
    KdfParams {
        memory_kib: 8_192,
        iterations: 1,
        parallelism: 1,
    }
}

// ---------------------------------------------------------------------------
// Key derivation (Argon2id)
// ---------------------------------------------------------------------------

#[test]
fn derive_key_same_inputs_same_output() {
    let password = b"my-secure-passphrase";
    let salt = generate_salt();

    let key1 = derive_key(password, &salt, &fast_params()).expect("derive 1");
    let key2 = derive_key(password, &salt, &fast_params()).expect("derive 2");

    assert_eq!(key1, key2, "same password + salt must produce the same key");
}

#[test]
fn derive_key_different_salts_different_keys() {
    let password = b"same-password";
    let salt1 = generate_salt();
    let salt2 = generate_salt();

    let key1 = derive_key(password, &salt1, &fast_params()).expect("derive 1");
    let key2 = derive_key(password, &salt2, &fast_params()).expect("derive 2");

    assert_ne!(key1, key2, "different salts must produce different keys");
}

#[test]
fn derive_key_different_passwords_different_keys() {
    let salt = generate_salt();

    let key1 = derive_key(b"password-one", &salt, &fast_params()).expect("derive 1");
    let key2 = derive_key(b"password-two", &salt, &fast_params()).expect("derive 2");

    assert_ne!(
        key1, key2,
        "different passwords must produce different keys"
    );
}

#[test]
fn zero_iterations_rejected() {
    let params = KdfParams {
        iterations: 0,
        ..fast_params()
    };
    let result = derive_key(b"pw", &generate_salt(), &params);
    assert!(result.is_err(), "zero iterations must be rejected");
}

#[test]
fn zero_parallelism_rejected() {
    let params = KdfParams {
        parallelism: 0,
        ..fast_params()
    };
    let result = derive_key(b"pw", &generate_salt(), &params);
    assert!(result.is_err(), "zero parallelism must be rejected");
}

#[test]
fn too_little_memory_rejected() {
    let params = KdfParams {
        memory_kib: 1_024,
        ..fast_params()
    };
    let result = derive_key(b"pw", &generate_salt(), &params);
    assert!(result.is_err(), "memory below the floor must be rejected");
}

// ---------------------------------------------------------------------------
// Authenticated encryption round-trip
// ---------------------------------------------------------------------------

#[test]
fn seal_open_roundtrip() {
    let key = [0xABu8; 32];
    let plaintext = b"correct horse battery staple";
    let aad = b"record:7";

    let blob = seal(&key, plaintext, aad).expect("seal should succeed");

    // Blob must carry the 12-byte nonce and 16-byte tag.
    assert_eq!(blob.len(), plaintext.len() + 28);

    let recovered = open(&key, &blob, aad).expect("open should succeed");
    assert_eq!(recovered, plaintext);
}

#[test]
fn seal_produces_fresh_nonce_each_time() {
    let key = [0xCDu8; 32];
    let plaintext = b"same plaintext";
    let aad = b"record:1";

    let blob1 = seal(&key, plaintext, aad).expect("seal 1");
    let blob2 = seal(&key, plaintext, aad).expect("seal 2");

    // Because each call generates a new random nonce, the output must differ.
    assert_ne!(blob1, blob2, "two seals of the same plaintext must differ");
}

#[test]
fn open_with_wrong_key_fails() {
    let key = [0x11u8; 32];
    let wrong_key = [0x22u8; 32];
    let aad = b"record:1";

    let blob = seal(&key, b"top secret", aad).expect("seal");
    assert!(
        open(&wrong_key, &blob, aad).is_err(),
        "opening with the wrong key must fail"
    );
}

#[test]
fn open_with_wrong_aad_fails() {
    let key = [0x33u8; 32];

    let blob = seal(&key, b"bound to record 1", b"record:1").expect("seal");
    assert!(
        open(&key, &blob, b"record:2").is_err(),
        "a record must not open under another record's associated data"
    );
}

#[test]
fn open_detects_ciphertext_bit_flip() {
    let key = [0x44u8; 32];
    let aad = b"record:1";

    let mut blob = seal(&key, b"payload bytes", aad).expect("seal");
    // Flip a bit in the ciphertext portion (after the 12-byte nonce).
    blob[14] ^= 0x01;

    assert!(
        open(&key, &blob, aad).is_err(),
        "a single flipped bit must fail authentication"
    );
}

#[test]
fn open_detects_tag_bit_flip() {
    let key = [0x55u8; 32];
    let aad = b"record:1";

    let mut blob = seal(&key, b"payload bytes", aad).expect("seal");
    // The tag is the last 16 bytes of the blob.
    let last = blob.len() - 1;
    blob[last] ^= 0x01;

    assert!(
        open(&key, &blob, aad).is_err(),
        "a flipped tag bit must fail authentication"
    );
}

#[test]
fn open_with_truncated_blob_fails() {
    let key = [0x66u8; 32];
    // Shorter than nonce + tag can never be valid.
    assert!(open(&key, &[0u8; 20], b"").is_err());
}
