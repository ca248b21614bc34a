//! Static rule tables driving the generator
//!
//! Nothing in here is random on its own: the generator draws a category
//! and everything derived from it (capacity, speeds, price, severity,
//! duration range) is read back from these tables.

pub mod incidents;
pub mod locations;
pub mod plans;
pub mod technology;

pub use incidents::{IncidentStatus, IncidentType, Severity};
pub use locations::{
    builtin_locations, is_high_growth_suburb, load_locations_file, validate_locations,
    CatalogError, CatalogResult, SeedLocation, HIGH_GROWTH_SUBURBS,
};
pub use plans::{PlanSpec, PlanTier, PremiseType};
pub use technology::Technology;

use rand::Rng;

/// Pick a value from `(cumulative upper bound, value)` pairs using a single
/// uniform draw. The last bound must be 1.0.
pub(crate) fn pick_cumulative<T: Copy, R: Rng + ?Sized>(rng: &mut R, table: &[(f64, T)]) -> T {
    let draw: f64 = rng.gen();
    let mut chosen = table[0].1;
    for &(bound, value) in table {
        chosen = value;
        if draw < bound {
            break;
        }
    }
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_pick_cumulative_follows_weights() {
        let table = [(0.7, 'a'), (0.9, 'b'), (1.0, 'c')];
        let mut rng = StdRng::seed_from_u64(9);
        let mut counts = [0usize; 3];
        for _ in 0..20_000 {
            match pick_cumulative(&mut rng, &table) {
                'a' => counts[0] += 1,
                'b' => counts[1] += 1,
                _ => counts[2] += 1,
            }
        }
        let share = |n: usize| n as f64 / 20_000.0;
        assert!((share(counts[0]) - 0.7).abs() < 0.02);
        assert!((share(counts[1]) - 0.2).abs() < 0.02);
        assert!((share(counts[2]) - 0.1).abs() < 0.02);
    }
}
