use digienv_crypto::{
    CryptoError, KdfParams, ProtectedSecretKey, RecipientKeyPair, decode_public_key,
    encode_public_key, load_protected_secret_key, load_public_key, load_secret_key,
    save_protected_secret_key, save_public_key, save_secret_key,
};
use std::fs;
use tempfile::tempdir;

#[test]
fn secret_key_file_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("recipient.key");
    let kp = RecipientKeyPair::generate().unwrap();

    save_secret_key(&path, &kp.secret).unwrap();
    let loaded = load_secret_key(&path).unwrap();

    assert_eq!(loaded.to_bytes(), kp.secret.to_bytes());
}

#[test]
fn public_key_file_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("recipient.pub");
    let kp = RecipientKeyPair::generate().unwrap();

    save_public_key(&path, &kp.public).unwrap();
    let loaded = load_public_key(&path).unwrap();

    assert_eq!(loaded.as_bytes(), kp.public.as_bytes());
}

#[test]
fn key_file_with_wrong_length_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("short.key");
    fs::write(&path, "AAAA\n").unwrap();

    let err = load_secret_key(&path).unwrap_err();
    assert!(matches!(err, CryptoError::KeyFile(_)), "got {err:?}");
}

#[test]
fn key_file_with_garbage_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("garbage.key");
    fs::write(&path, "not base64 at all!").unwrap();

    assert!(matches!(
        load_secret_key(&path).unwrap_err(),
        CryptoError::KeyFile(_)
    ));
}

#[test]
fn missing_key_file_is_io_error() {
    let dir = tempdir().unwrap();
    let err = load_secret_key(&dir.path().join("absent.key")).unwrap_err();
    assert!(matches!(err, CryptoError::Io(_)));
}

#[test]
fn public_key_text_roundtrip() {
    let kp = RecipientKeyPair::generate().unwrap();
    let encoded = encode_public_key(&kp.public);
    let decoded = decode_public_key(&format!("  {encoded}\n")).unwrap();
    assert_eq!(decoded.as_bytes(), kp.public.as_bytes());
}

#[test]
fn protected_key_roundtrip() {
    let kp = RecipientKeyPair::generate().unwrap();
    let protected =
        ProtectedSecretKey::protect(&kp.secret, "correct-horse", KdfParams::insecure_fast())
            .unwrap();

    let recovered = protected.unprotect("correct-horse").unwrap();
    assert_eq!(recovered.to_bytes(), kp.secret.to_bytes());
}

#[test]
fn protected_key_wrong_passphrase_fails() {
    let kp = RecipientKeyPair::generate().unwrap();
    let protected =
        ProtectedSecretKey::protect(&kp.secret, "correct-horse", KdfParams::insecure_fast())
            .unwrap();

    let err = protected.unprotect("battery-staple").unwrap_err();
    assert!(matches!(err, CryptoError::Decryption(_)));
}

#[test]
fn protected_key_file_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("recipient.key.json");
    let kp = RecipientKeyPair::generate().unwrap();

    let protected =
        ProtectedSecretKey::protect(&kp.secret, "file-passphrase", KdfParams::insecure_fast())
            .unwrap();
    save_protected_secret_key(&path, &protected).unwrap();

    let loaded = load_protected_secret_key(&path, "file-passphrase").unwrap();
    assert_eq!(loaded.to_bytes(), kp.secret.to_bytes());

    let json = fs::read_to_string(&path).unwrap();
    assert!(json.contains("\"kdf\""));
}

#[test]
fn default_kdf_params() {
    let params = KdfParams::default();
    assert_eq!(params.memory_kib, 19 * 1024);
    assert_eq!(params.iterations, 2);
    assert_eq!(params.parallelism, 1);
}
