use criterion::{criterion_group, criterion_main, Criterion};
use distrib_accel::AcceleratorPool;
use tokio::runtime::Runtime;

fn reserve_release_cycle(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let pool = AcceleratorPool::new(4);

    c.bench_function("reserve_release_uncontended", |b| {
        b.to_async(&rt).iter(|| {
            let pool = pool.clone();
            async move {
                let r = pool.reserve().await;
                drop(r);
            }
        });
    });
}

criterion_group!(benches, reserve_release_cycle);
criterion_main!(benches);
