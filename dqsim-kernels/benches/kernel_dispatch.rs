//! Kernel family benchmarks across target counts and backends

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dqsim_core::matrices::HADAMARD;
use dqsim_core::GateMatrix;
use dqsim_kernels::{select_kernel, Backend};
use num_complex::Complex64;

fn test_state(num_qubits: usize) -> Vec<Complex64> {
    let dim = 1 << num_qubits;
    let amp = 1.0 / (dim as f64).sqrt();
    vec![Complex64::new(amp, 0.0); dim]
}

fn random_unitary_diagonalish(num_qubits: usize) -> GateMatrix {
    // a permutation-with-phases matrix is unitary and cheap to build
    let dim = 1 << num_qubits;
    let mut m = GateMatrix::zeros(num_qubits);
    for i in 0..dim {
        let phase = (i as f64) * 0.37;
        m.set(i, (i + 1) % dim, Complex64::new(phase.cos(), phase.sin()));
    }
    m
}

fn bench_single_qubit_families(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_qubit");
    let h = GateMatrix::from_2x2(&HADAMARD);

    for backend in [
        Backend::ScalarSerial,
        Backend::ScalarThreaded,
        Backend::VectorSerial,
        Backend::VectorThreaded,
    ] {
        let kernel = select_kernel(backend, 1).unwrap();
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{backend}")),
            &kernel,
            |b, kernel| {
                let mut state = test_state(18);
                b.iter(|| {
                    kernel(black_box(&mut state), &h, 0, &[9]);
                });
            },
        );
    }
    group.finish();
}

fn bench_fused_widths(c: &mut Criterion) {
    let mut group = c.benchmark_group("fused_width");
    for k in 1..=5usize {
        let m = random_unitary_diagonalish(k);
        let positions: Vec<usize> = (0..k).rev().collect();
        let kernel = select_kernel(Backend::ScalarSerial, k).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(k), &k, |b, _| {
            let mut state = test_state(16);
            b.iter(|| {
                kernel(black_box(&mut state), &m, 0, &positions);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_single_qubit_families, bench_fused_widths);
criterion_main!(benches);
