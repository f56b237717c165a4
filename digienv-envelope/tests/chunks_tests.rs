mod support;

use digienv_envelope::{DEFAULT_CHUNK_SIZE, Envelope, EnvelopeError, EnvelopeResult};
use pretty_assertions::assert_eq;
use support::{patterned, recipient, seal_bytes};

#[test]
fn chunk_sizes_follow_store_length() {
    let kp = recipient();
    let plaintext = patterned(10_000);
    let mut envelope = Envelope::from_artifact(kp.public.clone(), seal_bytes(&kp, &plaintext));
    envelope.unseal(&kp.secret).unwrap();

    let chunks = envelope
        .with_scope(|env| env.read_chunks(4096).collect::<EnvelopeResult<Vec<_>>>())
        .unwrap();

    let sizes: Vec<usize> = chunks.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![4096, 4096, 1808]);
    assert_eq!(chunks.concat(), plaintext);
}

#[test]
fn exact_multiple_has_no_trailing_chunk() {
    let kp = recipient();
    let plaintext = patterned(2 * DEFAULT_CHUNK_SIZE);
    let mut envelope = Envelope::from_artifact(kp.public.clone(), seal_bytes(&kp, &plaintext));
    envelope.unseal(&kp.secret).unwrap();

    let count = envelope
        .with_scope(|env| {
            let mut count = 0;
            for chunk in env.read_chunks(DEFAULT_CHUNK_SIZE) {
                assert_eq!(chunk?.len(), DEFAULT_CHUNK_SIZE);
                count += 1;
            }
            Ok(count)
        })
        .unwrap();
    assert_eq!(count, 2);
}

#[test]
fn empty_envelope_yields_nothing() {
    let kp = recipient();
    let mut envelope = Envelope::from_artifact(kp.public.clone(), seal_bytes(&kp, b""));
    envelope.unseal(&kp.secret).unwrap();

    let count = envelope
        .with_scope(|env| Ok(env.read_chunks(16).count()))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn chunks_resume_after_partial_read() {
    let kp = recipient();
    let mut envelope = Envelope::from_artifact(kp.public.clone(), seal_bytes(&kp, b"abcdefghij"));
    envelope.unseal(&kp.secret).unwrap();

    let rest = envelope
        .with_scope(|env| {
            env.read(Some(3))?;
            env.read_chunks(4).collect::<EnvelopeResult<Vec<_>>>()
        })
        .unwrap();
    assert_eq!(rest, vec![b"defg".to_vec(), b"hij".to_vec()]);
}

#[test]
fn chunks_on_sealed_envelope_fail_once() {
    let kp = recipient();
    let mut envelope = Envelope::from_artifact(kp.public.clone(), seal_bytes(&kp, b"data"));

    let mut chunks = envelope.read_chunks(2);
    assert!(matches!(chunks.next(), Some(Err(EnvelopeError::Sealed))));
    assert!(chunks.next().is_none());
}

#[test]
fn chunks_outside_scope_fail_with_closed() {
    let kp = recipient();
    let mut envelope = Envelope::from_artifact(kp.public.clone(), seal_bytes(&kp, b"data"));
    envelope.unseal(&kp.secret).unwrap();

    let first = envelope.read_chunks(2).next();
    assert!(matches!(first, Some(Err(EnvelopeError::Closed))));
}

#[test]
fn exhausted_iterator_stays_exhausted() {
    let kp = recipient();
    let mut envelope = Envelope::from_artifact(kp.public.clone(), seal_bytes(&kp, b"xy"));
    envelope.unseal(&kp.secret).unwrap();

    envelope
        .with_scope(|env| {
            let mut chunks = env.read_chunks(8);
            assert_eq!(chunks.next().transpose()?, Some(b"xy".to_vec()));
            assert!(chunks.next().is_none());
            assert!(chunks.next().is_none());
            Ok(())
        })
        .unwrap();
}
