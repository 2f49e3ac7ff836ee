use std::time::Duration;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use warden_auth::{Permission, PermissionRegistry, Role, TokenSigner};
use warden_core::UserId;

fn bench_issue(c: &mut Criterion) {
    let signer = TokenSigner::new("bench-secret", Duration::from_secs(3600));
    let user_id = UserId::new();

    c.bench_function("token_issue", |b| {
        b.iter(|| signer.issue(black_box(user_id), black_box("bench@x.com"), Role::User))
    });
}

fn bench_verify(c: &mut Criterion) {
    let signer = TokenSigner::new("bench-secret", Duration::from_secs(3600));
    let token = signer
        .issue(UserId::new(), "bench@x.com", Role::Admin)
        .unwrap()
        .token;

    c.bench_function("token_verify", |b| b.iter(|| signer.verify(black_box(&token))));
}

fn bench_registry_lookup(c: &mut Criterion) {
    let registry = PermissionRegistry::standard();

    c.bench_function("registry_has", |b| {
        b.iter(|| registry.has(black_box(Role::Admin), black_box(Permission::AdminWrite)))
    });
}

criterion_group!(benches, bench_issue, bench_verify, bench_registry_lookup);
criterion_main!(benches);
