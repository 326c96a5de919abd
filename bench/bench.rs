use criterion::measurement::Measurement;
use criterion::{criterion_group, criterion_main, BenchmarkGroup, BenchmarkId, Criterion};

#[cfg(feature = "bench-internals")]
use umbral_threshold::bench::{
    capsule_from_public_key, capsule_open_original, capsule_open_reencrypted,
};

use umbral_threshold::{
    decrypt_original, decrypt_reencrypted, encrypt, generate_kfrags, reencrypt, SecretKey,
    Signer,
};

#[cfg(feature = "bench-internals")]
fn bench_capsule_from_public_key<'a, M: Measurement>(group: &mut BenchmarkGroup<'a, M>) {
    let delegating_sk = SecretKey::random();
    let delegating_pk = delegating_sk.public_key();
    group.bench_function("Capsule::from_public_key", |b| {
        b.iter(|| capsule_from_public_key(&delegating_pk))
    });
}

#[cfg(feature = "bench-internals")]
fn bench_capsule_open_original<'a, M: Measurement>(group: &mut BenchmarkGroup<'a, M>) {
    let delegating_sk = SecretKey::random();
    let delegating_pk = delegating_sk.public_key();
    let (capsule, _key_seed) = capsule_from_public_key(&delegating_pk);
    group.bench_function("Capsule::open_original", |b| {
        b.iter(|| capsule_open_original(&capsule, &delegating_sk))
    });
}

#[cfg(feature = "bench-internals")]
fn bench_capsule_open_reencrypted<'a, M: Measurement>(group: &mut BenchmarkGroup<'a, M>) {
    let delegating_sk = SecretKey::random();
    let delegating_pk = delegating_sk.public_key();

    let signer = Signer::new(SecretKey::random());

    let receiving_sk = SecretKey::random();
    let receiving_pk = receiving_sk.public_key();

    let (capsule, _key_seed) = capsule_from_public_key(&delegating_pk);

    let threshold: usize = 2;
    let num_frags: usize = threshold + 1;

    let kfrags = generate_kfrags(
        &delegating_sk,
        &receiving_pk,
        &signer,
        threshold,
        num_frags,
        true,
        true,
    )
    .unwrap();

    let cfrags: Vec<_> = kfrags
        .iter()
        .map(|kfrag| reencrypt(&capsule, kfrag.clone()).unverify())
        .collect();

    group.bench_function("Capsule::open_reencrypted", |b| {
        b.iter(|| {
            capsule_open_reencrypted(
                &capsule,
                &receiving_sk,
                &delegating_pk,
                &cfrags[0..threshold],
            )
        })
    });
}

fn bench_pre<'a, M: Measurement>(group: &mut BenchmarkGroup<'a, M>) {
    let delegating_sk = SecretKey::random();
    let delegating_pk = delegating_sk.public_key();
    let plaintext = b"peace at dawn";

    // Encryption

    group.bench_function("encrypt", |b| {
        b.iter(|| encrypt(&delegating_pk, &plaintext[..]))
    });

    // Decryption with the original key

    let (capsule, ciphertext) = encrypt(&delegating_pk, plaintext).unwrap();
    group.bench_function("decrypt_original", |b| {
        b.iter(|| decrypt_original(&delegating_sk, &capsule, &ciphertext[..]))
    });

    // Kfrag generation

    let threshold: usize = 2;
    let num_frags: usize = threshold + 1;

    let signer = Signer::new(SecretKey::random());
    let verifying_pk = signer.verifying_key();

    let receiving_sk = SecretKey::random();
    let receiving_pk = receiving_sk.public_key();

    group.bench_function("generate_kfrags", |b| {
        b.iter(|| {
            generate_kfrags(
                &delegating_sk,
                &receiving_pk,
                &signer,
                threshold,
                num_frags,
                true,
                true,
            )
        })
    });

    let verified_kfrags = generate_kfrags(
        &delegating_sk,
        &receiving_pk,
        &signer,
        threshold,
        num_frags,
        true,
        true,
    )
    .unwrap();

    let kfrag = verified_kfrags[0].clone().unverify();
    group.bench_function("KeyFrag::verify", |b| {
        b.iter(|| {
            kfrag
                .clone()
                .verify(&verifying_pk, Some(&delegating_pk), Some(&receiving_pk))
        })
    });

    // Reencryption

    let vkfrag = verified_kfrags[0].clone();
    group.bench_function("reencrypt", |b| {
        b.iter(|| reencrypt(&capsule, vkfrag.clone()))
    });

    let cfrag = reencrypt(&capsule, vkfrag).unverify();
    group.bench_function("CapsuleFrag::verify", |b| {
        b.iter(|| {
            cfrag
                .clone()
                .verify(&capsule, &verifying_pk, &delegating_pk, &receiving_pk)
        })
    });

    // Decryption of the reencrypted data

    let verified_cfrags: Vec<_> = verified_kfrags[0..threshold]
        .iter()
        .map(|vkfrag| reencrypt(&capsule, vkfrag.clone()))
        .collect();

    group.bench_function("decrypt_reencrypted", |b| {
        b.iter(|| {
            decrypt_reencrypted(
                &receiving_sk,
                &delegating_pk,
                &capsule,
                verified_cfrags.iter().cloned(),
                &ciphertext,
            )
        })
    });
}

fn bench_decrypt_reencrypted_by_threshold<'a, M: Measurement>(
    group: &mut BenchmarkGroup<'a, M>,
) {
    let delegating_sk = SecretKey::random();
    let delegating_pk = delegating_sk.public_key();
    let signer = Signer::new(SecretKey::random());
    let receiving_sk = SecretKey::random();
    let receiving_pk = receiving_sk.public_key();

    let (capsule, ciphertext) = encrypt(&delegating_pk, b"peace at dawn").unwrap();

    for threshold in [1usize, 2, 4, 8, 16].iter().copied() {
        let kfrags = generate_kfrags(
            &delegating_sk,
            &receiving_pk,
            &signer,
            threshold,
            threshold,
            false,
            false,
        )
        .unwrap();
        let verified_cfrags: Vec<_> = kfrags
            .iter()
            .map(|kfrag| reencrypt(&capsule, kfrag.clone()))
            .collect();

        group.bench_with_input(
            BenchmarkId::new("decrypt_reencrypted", threshold),
            &verified_cfrags,
            |b, cfrags| {
                b.iter(|| {
                    decrypt_reencrypted(
                        &receiving_sk,
                        &delegating_pk,
                        &capsule,
                        cfrags.iter().cloned(),
                        &ciphertext,
                    )
                })
            },
        );
    }
}

#[cfg(feature = "bench-internals")]
fn group_internals(c: &mut Criterion) {
    let mut group = c.benchmark_group("internals");
    bench_capsule_from_public_key(&mut group);
    bench_capsule_open_original(&mut group);
    bench_capsule_open_reencrypted(&mut group);
    group.finish();
}

fn group_pre(c: &mut Criterion) {
    let mut group = c.benchmark_group("PRE API");
    bench_pre(&mut group);
    group.finish();
}

fn group_threshold(c: &mut Criterion) {
    let mut group = c.benchmark_group("threshold scaling");
    bench_decrypt_reencrypted_by_threshold(&mut group);
    group.finish();
}

#[cfg(feature = "bench-internals")]
criterion_group!(benches, group_internals, group_pre, group_threshold);

#[cfg(not(feature = "bench-internals"))]
criterion_group!(benches, group_pre, group_threshold);

criterion_main!(benches);
