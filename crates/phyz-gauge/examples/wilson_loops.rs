//! Wilson loop and Polyakov loop measurements on cold and hot lattices.
//!
//! A cold (ordered) field has ⟨W⟩ = 1 for every loop; a hot (Haar random)
//! field decorrelates every loop, so ⟨W(R,T)⟩ collapses towards zero.

use phyz_gauge::{LatticeField, Topology};
use phyz_lie::{Group, RayonBackend, SpecialUnitary, U1};

fn report<G: Group>(label: &str, lattice: &LatticeField<G>, beta: f64) {
    println!("{label}");
    println!("  S_W(β = {beta:.1})      = {:.4}", lattice.action(beta));
    println!("  S_imp(c1 = -1/12)   = {:.4}", lattice.improved_action(beta, -1.0 / 12.0));
    println!("  ⟨P⟩                 = {:.4}", lattice.average_plaquette());
    println!("  ⟨|L|⟩ (direction 3) = {:.4}", lattice.average_polyakov_loop(3).unwrap_or(f64::NAN));

    println!("    R   T   ⟨W(R,T)⟩");
    for &(r, t) in &[(1, 1), (1, 2), (2, 2), (2, 3)] {
        match lattice.average_wilson_loop(r, t) {
            Ok(w) => println!("    {r}   {t}   {w:+.4}"),
            Err(e) => println!("    {r}   {t}   error: {e}"),
        }
    }
    println!();
}

fn main() {
    println!("Wilson loop measurements");
    println!("{}", "=".repeat(60));

    let topology = Topology::hypercubic(4, 6).expect("valid extents");
    let beta = 6.0;

    let u1 = U1::new().with_backend(RayonBackend::default());
    report("U(1), cold start", &LatticeField::identity(topology.clone(), u1.clone()), beta);
    report("U(1), hot start", &LatticeField::random_seeded(topology.clone(), u1, 1), beta);

    for n in [2, 3] {
        let group = SpecialUnitary::new(n)
            .expect("N >= 2")
            .with_backend(RayonBackend::default());
        report(
            &format!("SU({n}), hot start"),
            &LatticeField::random_seeded(topology.clone(), group, 7),
            beta,
        );
    }

    println!("{}", "=".repeat(60));
    println!("Area law ⟨W⟩ ~ exp(-σ RT) needs an equilibrated ensemble;");
    println!("these fields only bracket the cold and infinitely hot limits.");
}
