use digienv_crypto::CryptoError;
use digienv_envelope::{EnvelopeError, EnvelopeState};

#[test]
fn invalid_state_display() {
    let err = EnvelopeError::InvalidState {
        operation: "enter scope",
        state: EnvelopeState::Sealed,
    };
    assert_eq!(err.to_string(), "cannot enter scope while envelope is sealed");
}

#[test]
fn closed_display() {
    assert_eq!(
        EnvelopeError::Closed.to_string(),
        "envelope is closed: read and write require an open scope"
    );
}

#[test]
fn sealed_display() {
    assert_eq!(
        EnvelopeError::Sealed.to_string(),
        "envelope is sealed: unseal it before reading"
    );
}

#[test]
fn already_sealed_display() {
    assert_eq!(
        EnvelopeError::AlreadySealed.to_string(),
        "envelope has been sealed already"
    );
}

#[test]
fn unwrap_error_maps_from_crypto() {
    let err: EnvelopeError = CryptoError::Unwrap("wrong private key".into()).into();
    assert!(matches!(err, EnvelopeError::Unwrap(ref msg) if msg == "wrong private key"));
    assert_eq!(err.to_string(), "cannot unwrap envelope key: wrong private key");
}

#[test]
fn entropy_error_maps_from_crypto() {
    let err: EnvelopeError = CryptoError::EntropyUnavailable("getrandom failed".into()).into();
    assert!(matches!(err, EnvelopeError::EntropyUnavailable(_)));
    assert_eq!(err.to_string(), "entropy source unavailable: getrandom failed");
}

#[test]
fn other_crypto_errors_are_wrapped() {
    let err: EnvelopeError = CryptoError::InvalidKeyLength {
        expected: 32,
        actual: 16,
    }
    .into();
    assert!(matches!(err, EnvelopeError::Crypto(_)));
    assert_eq!(
        err.to_string(),
        "crypto error: invalid key length: expected 32, got 16"
    );
}

#[test]
fn io_error_converts() {
    let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read");
    let err: EnvelopeError = io.into();
    assert_eq!(err.to_string(), "store I/O error: short read");
}

#[test]
fn artifact_display() {
    let err = EnvelopeError::Artifact("bad magic".into());
    assert_eq!(err.to_string(), "invalid artifact: bad magic");
}

#[test]
fn config_display() {
    let err = EnvelopeError::Config("chunk_size must be positive".into());
    assert_eq!(err.to_string(), "invalid configuration: chunk_size must be positive");
}
