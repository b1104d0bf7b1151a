//! Registry throughput benchmarks.
//!
//! Measures the registry state machine on its own and the full round trip
//! through a shield's serial queue.

use criterion::{Criterion, criterion_group, criterion_main};
use lk_common::board::{Arch, Rb2, Rb2Socket};
use lk_common::socket::SocketSpec;
use lk_shield::drivers::simulation::SimulatedPinBank;
use lk_shield::{Accessory, AccessoryHandle, Registry, Shield, ShieldId, ShieldPort};
use std::hint::black_box;
use std::sync::Arc;

struct Nop;
impl Accessory for Nop {}

fn registry() -> Registry<Rb2> {
    Registry::new(ShieldPort::new(
        ShieldId::next(),
        Arc::new(SimulatedPinBank::for_board::<Rb2>()),
        Vec::new(),
    ))
}

fn bench_connect_disconnect(c: &mut Criterion) {
    let mut registry = registry();
    let handle = AccessoryHandle::new(Arc::new(Nop));

    c.bench_function("registry_connect_disconnect", |b| {
        b.iter(|| {
            registry.connect(handle.clone(), black_box(Rb2Socket::Digital1718));
            registry.disconnect(black_box(&handle));
        });
    });
}

fn bench_hot_swap_full_board(c: &mut Criterion) {
    let mut registry = registry();
    let handles: Vec<AccessoryHandle> = Rb2Socket::ALL
        .iter()
        .map(|_| AccessoryHandle::new(Arc::new(Nop)))
        .collect();
    let mut shift = 0;

    c.bench_function("registry_rotate_18_sockets", |b| {
        b.iter(|| {
            shift += 1;
            for (i, h) in handles.iter().enumerate() {
                let socket = Rb2Socket::ALL[(i + shift) % Rb2Socket::ALL.len()];
                registry.connect(h.clone(), socket);
            }
        });
    });
}

fn bench_shield_round_trip(c: &mut Criterion) {
    let Some(shield) = Shield::<Rb2>::new_for(
        Arch::Aarch64,
        Arc::new(SimulatedPinBank::for_board::<Rb2>()),
        None,
    ) else {
        return;
    };
    let nop = Arc::new(Nop);

    c.bench_function("shield_connect_snapshot", |b| {
        b.iter(|| {
            shield.connect(nop.clone(), Rb2Socket::Uart);
            black_box(shield.accessories());
        });
    });
}

criterion_group!(
    benches,
    bench_connect_disconnect,
    bench_hot_swap_full_board,
    bench_shield_round_trip
);
criterion_main!(benches);
