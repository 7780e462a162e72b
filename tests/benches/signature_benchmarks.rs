//! # Lease Signature Benchmarks
//!
//! | Path | Target |
//! |------|--------|
//! | Status computation, 2-12 signers | < 5µs |
//! | Full sign request, in-memory adapters | < 1ms |

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use lease_signature::test_utils::LeaseFixture;
use lease_signature::{assess, LeaseSignatureApi, Signer};
use shared_types::{LeaseId, ProfileId, SignerRole};

fn roster(size: usize, signed: usize) -> Vec<Signer> {
    let lease = LeaseId::new();
    (0..size)
        .map(|i| {
            let role = match i {
                0 => SignerRole::Owner,
                1 => SignerRole::PrincipalTenant,
                i if i % 3 == 0 => SignerRole::Guarantor,
                _ => SignerRole::CoTenant,
            };
            let mut signer = Signer::bound(lease, ProfileId::new(), role);
            if i < signed {
                signer.status = shared_types::SignatureStatus::Signed;
            }
            signer
        })
        .collect()
}

fn bench_status_computation(c: &mut Criterion) {
    let mut group = c.benchmark_group("status-computation");
    for size in [2usize, 4, 8, 12] {
        let half = roster(size, size / 2);
        let full = roster(size, size);
        group.bench_with_input(BenchmarkId::new("half_signed", size), &half, |b, r| {
            b.iter(|| assess(black_box(r)))
        });
        group.bench_with_input(BenchmarkId::new("fully_signed", size), &full, |b, r| {
            b.iter(|| assess(black_box(r)))
        });
    }
    group.finish();
}

fn bench_sign_request(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    c.bench_function("sign-invited-tenant", |b| {
        b.to_async(&rt).iter_batched(
            || {
                let fixture = LeaseFixture::new();
                fixture.add_signer(Signer::bound(
                    fixture.lease.id,
                    fixture.owner.id,
                    SignerRole::Owner,
                ));
                fixture.invited_tenant(SignerRole::PrincipalTenant);
                let request = fixture.request(fixture.tenant_caller());
                (fixture.service(), request)
            },
            |(service, request)| async move { service.sign(request).await },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_status_computation, bench_sign_request);
criterion_main!(benches);
