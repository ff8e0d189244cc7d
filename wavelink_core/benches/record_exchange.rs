//! Record write/read throughput benchmarks

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use wavelink_core::{SharedHeader, SharedMemory, SocketToDisplay};

/// Write every waveform parameter of a mapped segment, then read them back
fn bench_shared_segment(c: &mut Criterion) {
    let mut group = c.benchmark_group("shared_segment");
    for waves in [4usize, 32, 256] {
        let name = format!("wl_bench_{}_{}", waves, std::process::id());
        let mut shm = SharedMemory::<SharedHeader>::create_record(&name, 1, waves, true).unwrap();
        {
            let mut view = shm.get_mut().unwrap();
            for (i, p) in view.wave_parameters_mut().iter_mut().enumerate() {
                p.set_name(&format!("w{}", i));
            }
        }

        group.bench_with_input(BenchmarkId::new("write", waves), &waves, |b, _| {
            let mut tick = 0u64;
            b.iter(|| {
                tick += 1;
                let mut view = shm.get_mut().unwrap();
                for p in view.wave_parameters_mut() {
                    p.set_value(black_box(tick as f64));
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("read", waves), &waves, |b, _| {
            b.iter(|| {
                let view = shm.get().unwrap();
                let sum: f64 = view
                    .wave_parameters()
                    .iter()
                    .map(|p| p.double().unwrap_or(0.0))
                    .sum();
                black_box(sum)
            });
        });
    }
    group.finish();
}

/// Copy a received byte image into an owned record and look one value up
fn bench_socket_record_load(c: &mut Criterion) {
    let mut source = SocketToDisplay::with_params(64).unwrap();
    {
        let mut view = source.view_mut().unwrap();
        for (i, p) in view.parameters_mut().iter_mut().enumerate() {
            p.set_name(&format!("w{}", i));
            p.set_value([i as f32, 0.0, 1.0]);
        }
    }
    let image = source.as_bytes().to_vec();
    let mut target = SocketToDisplay::with_params(64).unwrap();

    c.bench_function("load_64_param_record", |b| {
        b.iter(|| {
            target.load_bytes(black_box(&image)).unwrap();
            let mut view = target.view_mut().unwrap();
            let pc = view.collect_parameters("bench");
            black_box(pc.lookup("w63").map(|p| p.vec3f_component(0)).is_ok())
        });
    });
}

criterion_group!(benches, bench_shared_segment, bench_socket_record_load);
criterion_main!(benches);
