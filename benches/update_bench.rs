//! Benchmarks for one multilevel update step.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use multilevel_core::{
    ComplexPart, Component, CouplingMatrix, ExtendedMultilevelSusceptibility, FieldSet, GridVolume,
    MultilevelSusceptibility, NonRadiativeTransition, RadiativeTransition, SigmaTable, Susceptibility,
    TransitionKind, UpdateConfig,
};

/// Four-level laser scheme: pump 0 -> 3, lasing 2 -> 1, fast decays 3 -> 2 and 1 -> 0.
fn four_level(ntot: usize, config: UpdateConfig) -> MultilevelSusceptibility {
    let gamma = vec![
        0.0, -0.5, 0.0, 0.0, //
        0.0, 0.5, -0.01, 0.0, //
        0.0, 0.0, 0.01, -0.5, //
        0.0, 0.0, 0.0, 0.5,
    ];
    let alpha = CouplingMatrix::from_pairs(TransitionKind::Radiative, 4, &[(2, 1), (3, 0)]).unwrap();
    let mut sigma = SigmaTable::new();
    for c in [Component::Ex, Component::Ey, Component::Ez] {
        sigma = sigma.with_uniform_diagonal(c, ntot, 1.0);
    }
    MultilevelSusceptibility::new(
        gamma,
        vec![1.0, 0.0, 0.0, 0.0],
        alpha,
        vec![
            RadiativeTransition::isotropic(1.0, 0.05, 1e-3),
            RadiativeTransition::isotropic(1.5, 0.05, 1e-3),
        ],
    )
    .unwrap()
    .with_sigma(sigma)
    .with_config(config)
}

/// Lambda scheme: 0 and 1 both couple radiatively to 2 and share a coherence.
fn lambda(ntot: usize) -> ExtendedMultilevelSusceptibility {
    let alpha = CouplingMatrix::from_pairs(TransitionKind::Radiative, 3, &[(2, 0), (2, 1)]).unwrap();
    let mut sigma = SigmaTable::new();
    for c in [Component::Ex, Component::Ey, Component::Ez] {
        sigma = sigma.with_uniform_diagonal(c, ntot, 1.0);
    }
    let base = MultilevelSusceptibility::new(
        vec![0.0; 9],
        vec![0.5, 0.5, 0.0],
        alpha,
        vec![
            RadiativeTransition::isotropic(1.0, 0.05, 1e-3),
            RadiativeTransition::isotropic(1.1, 0.05, 1e-3),
        ],
    )
    .unwrap()
    .with_sigma(sigma);
    let beta = CouplingMatrix::from_pairs(TransitionKind::NonRadiative, 3, &[(1, 0)]).unwrap();
    ExtendedMultilevelSusceptibility::new(base, beta, vec![NonRadiativeTransition::new(0.1, 0.2)]).unwrap()
}

fn electric_fields(ntot: usize, value: f64) -> FieldSet {
    FieldSet::new(ntot)
        .with_uniform(Component::Ex, ComplexPart::Re, value)
        .with_uniform(Component::Ey, ComplexPart::Re, value)
        .with_uniform(Component::Ez, ComplexPart::Re, value)
}

fn bench_update_p(c: &mut Criterion) {
    let sizes = [(16, 16, 16), (32, 32, 32), (64, 64, 64)];

    for (nx, ny, nz) in sizes {
        let gv = GridVolume::three_d(nx, ny, nz).unwrap();
        let ntot = gv.ntot();
        let w = electric_fields(ntot, 0.1);
        let w_prev = electric_fields(ntot, 0.09);

        let mut group = c.benchmark_group(format!("update_p_{}x{}x{}", nx, ny, nz));
        group.throughput(Throughput::Elements(ntot as u64));
        group.sample_size(20);

        for (label, config) in [
            ("serial", UpdateConfig::serial()),
            ("parallel", UpdateConfig::new().with_parallel_threshold(0)),
        ] {
            let medium = four_level(ntot, config);
            group.bench_function(label, |b| {
                let mut data = medium.new_internal_data(&w, &gv).unwrap();
                medium.init_internal_data(&w, 0.05, &gv, &mut data).unwrap();
                b.iter(|| {
                    medium.update_p(&w, &w_prev, 0.05, &gv, &mut data).unwrap();
                    black_box(&data);
                });
            });
        }

        let extended = lambda(ntot);
        group.bench_function("extended", |b| {
            let mut data = extended.new_internal_data(&w, &gv).unwrap();
            extended.init_internal_data(&w, 0.05, &gv, &mut data).unwrap();
            b.iter(|| {
                extended.update_p(&w, &w_prev, 0.05, &gv, &mut data).unwrap();
                black_box(&data);
            });
        });

        group.finish();
    }
}

criterion_group!(benches, bench_update_p);
criterion_main!(benches);
