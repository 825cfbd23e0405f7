//! Tiny deterministic beam source used by the bench harness and tests.
//! Produces a forward-peaked cone of photons and electrons around +z.

use rand::{rngs::StdRng, Rng as _, SeedableRng};

use crate::record::{ParticleKind, Record};

/// Generate `n` records with the requested extra-payload shape.
///
/// Deterministic (fixed seed) so runs are reproducible. Direction cosines
/// are normalized exactly; positions spread over a 10 cm square at z = 0.
#[must_use]
pub fn generate_beam(n: u64, extra_floats: u32, extra_longs: u32) -> Vec<Record> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut beam = Vec::with_capacity(n as usize);

    for i in 0..n {
        let kind = if rng.random_bool(0.8) {
            ParticleKind::Photon
        } else {
            ParticleKind::Electron
        };
        let u: f32 = rng.random_range(-0.2..0.2);
        let v: f32 = rng.random_range(-0.2..0.2);
        let w = (1.0 - u * u - v * v).sqrt();

        beam.push(Record {
            kind,
            new_history: i == 0 || rng.random_bool(0.3),
            energy: rng.random_range(0.05..6.0),
            weight: 1.0,
            x: rng.random_range(-5.0..5.0),
            y: rng.random_range(-5.0..5.0),
            z: 0.0,
            u,
            v,
            w,
            extra_floats: (0..extra_floats).map(|_| rng.random_range(0.0..1.0)).collect(),
            extra_longs: (0..extra_longs).map(|_| rng.random_range(0..1000)).collect(),
        });
    }
    beam
}
