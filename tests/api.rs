mod common;

use std::thread;

use umbral_threshold::{
    decrypt_reencrypted, reencrypt, Capsule, CapsuleFrag, KeyFrag, PublicKey, SecretKey,
    SecretKeyFactory, Signer, VerifiedCapsuleFrag, VerifiedKeyFrag,
};

use common::{init_tracing, Parties};

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn public_types_are_thread_safe() {
    assert_send_sync::<SecretKey>();
    assert_send_sync::<PublicKey>();
    assert_send_sync::<Signer>();
    assert_send_sync::<SecretKeyFactory>();
    assert_send_sync::<Capsule>();
    assert_send_sync::<KeyFrag>();
    assert_send_sync::<VerifiedKeyFrag>();
    assert_send_sync::<CapsuleFrag>();
    assert_send_sync::<VerifiedCapsuleFrag>();
}

#[test]
fn proxies_reencrypt_concurrently() {
    init_tracing();
    let parties = Parties::new();
    let (capsule, ciphertext) = parties.encrypt(b"peace at dawn");
    let kfrags = parties.kfrags(3, 5);

    let cfrags: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = kfrags
            .iter()
            .cloned()
            .map(|vkfrag| {
                let capsule = &capsule;
                scope.spawn(move || reencrypt(capsule, vkfrag))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    // Reencryption is deterministic, so the threads produce the same fragments.
    for (cfrag, vkfrag) in cfrags.iter().zip(kfrags.iter()) {
        assert_eq!(cfrag, &reencrypt(&capsule, vkfrag.clone()));
    }

    let plaintext = decrypt_reencrypted(
        &parties.receiving_sk,
        &parties.delegating_pk,
        &capsule,
        cfrags.into_iter().skip(2),
        &ciphertext,
    )
    .unwrap();
    assert_eq!(&plaintext as &[u8], b"peace at dawn");
}

#[test]
fn cfrags_carry_kfrag_ids() {
    let parties = Parties::new();
    let (capsule, _ciphertext) = parties.encrypt(b"peace at dawn");
    let kfrags = parties.kfrags(2, 3);

    for vkfrag in kfrags.iter() {
        let kfrag = vkfrag.clone().unverify();
        let cfrag = reencrypt(&capsule, vkfrag.clone()).unverify();
        assert_eq!(cfrag.kfrag_id(), kfrag.id());
        assert_eq!(kfrag.threshold(), 2);
    }
    assert_ne!(
        kfrags[0].clone().unverify().id(),
        kfrags[1].clone().unverify().id()
    );
}

#[test]
fn secret_key_factory_is_deterministic() {
    let seed = [7u8; 32];
    assert_eq!(SecretKeyFactory::seed_size(), seed.len());

    let factory = SecretKeyFactory::from_seed(&seed).unwrap();
    let same_factory = SecretKeyFactory::from_seed(&seed).unwrap();

    let pk = factory.make_secret(b"alice").public_key();
    assert_eq!(pk, same_factory.make_secret(b"alice").public_key());
    assert_ne!(pk, factory.make_secret(b"bob").public_key());

    let child = factory.make_factory(b"child");
    assert_eq!(
        child.make_secret(b"alice").public_key(),
        same_factory.make_factory(b"child").make_secret(b"alice").public_key()
    );
    assert_ne!(child.make_secret(b"alice").public_key(), pk);

    assert!(SecretKeyFactory::from_seed(&seed[..31]).is_err());
}

#[test]
fn derived_keys_work_end_to_end() {
    let factory = SecretKeyFactory::random();
    let delegating_sk = factory.make_secret(b"delegating");
    let receiving_sk = factory.make_secret(b"receiving");
    let signer = Signer::new(factory.make_secret(b"signing"));

    let delegating_pk = delegating_sk.public_key();
    let receiving_pk = receiving_sk.public_key();

    let (capsule, ciphertext) = umbral_threshold::encrypt(&delegating_pk, b"hello").unwrap();
    let kfrags = umbral_threshold::generate_kfrags(
        &delegating_sk,
        &receiving_pk,
        &signer,
        1,
        1,
        false,
        true,
    )
    .unwrap();

    let vkfrag = kfrags[0]
        .clone()
        .unverify()
        .verify(&signer.verifying_key(), None, Some(&receiving_pk))
        .unwrap();
    let cfrag = reencrypt(&capsule, vkfrag);

    let plaintext =
        decrypt_reencrypted(&receiving_sk, &delegating_pk, &capsule, [cfrag], &ciphertext).unwrap();
    assert_eq!(&plaintext as &[u8], b"hello");
}

#[cfg(feature = "serde-support")]
mod serde_support {
    use umbral_threshold::{
        reencrypt, Capsule, CapsuleFrag, KeyFrag, PublicKey, SerializableToArray,
    };

    use super::common::Parties;

    #[test]
    fn json_transfer() {
        let parties = Parties::new();
        let (capsule, _ciphertext) = parties.encrypt(b"peace at dawn");
        let kfrags = parties.kfrags(2, 3);

        let pk_json = serde_json::to_string(&parties.delegating_pk).unwrap();
        assert_eq!(
            pk_json,
            format!("\"{}\"", hex::encode(parties.delegating_pk.to_array()))
        );
        let pk: PublicKey = serde_json::from_str(&pk_json).unwrap();
        assert_eq!(pk, parties.delegating_pk);

        let capsule_json = serde_json::to_string(&capsule).unwrap();
        let capsule_back: Capsule = serde_json::from_str(&capsule_json).unwrap();
        assert_eq!(capsule_back, capsule);

        // Verified fragments serialize the same way their unverified versions do.
        let kfrag_json = serde_json::to_string(&kfrags[0]).unwrap();
        assert_eq!(
            kfrag_json,
            serde_json::to_string(&kfrags[0].clone().unverify()).unwrap()
        );
        let kfrag: KeyFrag = serde_json::from_str(&kfrag_json).unwrap();
        let vkfrag = kfrag
            .verify(
                &parties.verifying_pk,
                Some(&parties.delegating_pk),
                Some(&parties.receiving_pk),
            )
            .unwrap();

        let cfrag_json = serde_json::to_string(&reencrypt(&capsule, vkfrag)).unwrap();
        let cfrag: CapsuleFrag = serde_json::from_str(&cfrag_json).unwrap();
        assert!(cfrag
            .verify(
                &capsule,
                &parties.verifying_pk,
                &parties.delegating_pk,
                &parties.receiving_pk
            )
            .is_ok());
    }
}
