use criterion::{black_box, criterion_group, criterion_main, Criterion};

use spin_wheel::{ClientSeed, Entry, Nonce, RoundVerifier, ServerSeed, WeightedOutcomeResolver};

fn bench_settlement(c: &mut Criterion) {
    let resolver = WeightedOutcomeResolver::default();
    let verifier = RoundVerifier::new(resolver);
    let seed = ServerSeed::from_hex("0".repeat(64)).unwrap();
    let client = ClientSeed::new("bench");
    let nonce = Nonce::from(1u64);
    let entries: Vec<Entry> = (0..10u64)
        .map(|i| Entry::new(format!("player-{}", i), 10_000_000 * (i + 1)))
        .collect();

    c.bench_function("compute_draw", |b| {
        b.iter(|| resolver.compute_draw(black_box(seed.expose()), "bench", "1"))
    });

    c.bench_function("settle_round_10_players", |b| {
        b.iter(|| resolver.settle_round(black_box(&seed), &client, &nonce, &entries).unwrap())
    });

    let outcome = resolver.settle_round(&seed, &client, &nonce, &entries).unwrap();
    c.bench_function("verify_round_10_players", |b| {
        b.iter(|| {
            verifier
                .verify(
                    black_box(&outcome.revealed_server_seed),
                    &outcome.server_seed_hash,
                    &outcome.client_seed,
                    &outcome.nonce,
                    &entries,
                    &outcome.winner_participant_id,
                )
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_settlement);
criterion_main!(benches);
