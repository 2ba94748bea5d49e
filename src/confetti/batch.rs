use rand::Rng;
use serde::Serialize;

pub const DEFAULT_BATCH_SIZE: usize = 40;

pub const PALETTE: [&str; 4] = ["#ff4d8b", "#ff8fa3", "#ffd166", "#ef476f"];

/// Source of uniform samples in `[0, 1)`.
///
/// Closures work directly, which is what tests use to replay fixed sequences.
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;
}

impl<F> RandomSource for F
where
    F: FnMut() -> f64,
{
    fn next_unit(&mut self) -> f64 {
        self()
    }
}

/// Adapts any `rand` generator, seeded or not.
pub struct RngSource<R>(pub R);

impl<R: Rng> RandomSource for RngSource<R> {
    fn next_unit(&mut self) -> f64 {
        self.0.gen::<f64>()
    }
}

/// One falling piece of confetti, in the units the page animates with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Particle {
    pub id: usize,
    /// Percent of viewport width.
    pub left: f64,
    /// Seconds.
    pub delay: f64,
    /// Seconds.
    pub duration: f64,
    /// Pixels.
    pub size: f64,
    pub color: &'static str,
    /// Degrees.
    pub rotate: f64,
}

impl Particle {
    fn sample(id: usize, random: &mut impl RandomSource) -> Self {
        let left = random.next_unit() * 100.0;
        let delay = random.next_unit() * 2.0;
        let duration = 3.0 + random.next_unit() * 3.0;
        let size = 8.0 + random.next_unit() * 10.0;
        let color_index =
            ((random.next_unit() * PALETTE.len() as f64) as usize).min(PALETTE.len() - 1);
        let rotate = random.next_unit() * 360.0;

        Particle {
            id,
            left,
            delay,
            duration,
            size,
            color: PALETTE[color_index],
            rotate,
        }
    }
}

/// Sample exactly `count` independent particles.
pub fn generate_batch(count: usize, random: &mut impl RandomSource) -> Vec<Particle> {
    (0..count).map(|id| Particle::sample(id, random)).collect()
}

/// A full-size batch from the thread-local generator.
#[cfg(test)]
pub fn generate_default_batch() -> Vec<Particle> {
    generate_batch(DEFAULT_BATCH_SIZE, &mut RngSource(rand::thread_rng()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn assert_in_range(p: &Particle) {
        assert!((0.0..100.0).contains(&p.left), "left {}", p.left);
        assert!((3.0..6.0).contains(&p.duration), "duration {}", p.duration);
        assert!((0.0..2.0).contains(&p.delay), "delay {}", p.delay);
        assert!((8.0..18.0).contains(&p.size), "size {}", p.size);
        assert!((0.0..360.0).contains(&p.rotate), "rotate {}", p.rotate);
        assert!(PALETTE.contains(&p.color), "color {}", p.color);
    }

    #[test]
    fn default_batch_has_forty_particles_in_range() {
        for _ in 0..20 {
            let batch = generate_default_batch();
            assert_eq!(batch.len(), 40);
            batch.iter().for_each(assert_in_range);
        }
    }

    #[test]
    fn batch_size_is_respected() {
        let mut rng = RngSource(StdRng::seed_from_u64(7));
        assert_eq!(generate_batch(0, &mut rng).len(), 0);
        assert_eq!(generate_batch(5, &mut rng).len(), 5);
        assert_eq!(generate_batch(250, &mut rng).len(), 250);
    }

    #[test]
    fn ids_follow_batch_position() {
        let mut rng = RngSource(StdRng::seed_from_u64(1));
        let ids: Vec<usize> = generate_batch(4, &mut rng).iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn seeded_sources_are_reproducible() {
        let a = generate_batch(40, &mut RngSource(StdRng::seed_from_u64(42)));
        let b = generate_batch(40, &mut RngSource(StdRng::seed_from_u64(42)));
        assert_eq!(a, b);
        a.iter().for_each(assert_in_range);
    }

    #[test]
    fn zero_samples_give_lower_bounds() {
        let batch = generate_batch(3, &mut || 0.0);
        for p in &batch {
            assert_eq!(p.left, 0.0);
            assert_eq!(p.delay, 0.0);
            assert_eq!(p.duration, 3.0);
            assert_eq!(p.size, 8.0);
            assert_eq!(p.rotate, 0.0);
            assert_eq!(p.color, PALETTE[0]);
        }
    }

    #[test]
    fn near_one_samples_stay_below_upper_bounds() {
        let batch = generate_batch(2, &mut || 0.999_999);
        for p in &batch {
            assert_in_range(p);
            assert_eq!(p.color, PALETTE[3]);
        }
    }

    #[test]
    fn samples_are_drawn_in_field_order() {
        let sequence = [0.5, 0.25, 0.5, 0.5, 0.6, 0.5];
        let mut i = 0;
        let mut next = || {
            let v = sequence[i % sequence.len()];
            i += 1;
            v
        };
        let p = &generate_batch(1, &mut next)[0];
        assert_eq!(p.left, 50.0);
        assert_eq!(p.delay, 0.5);
        assert_eq!(p.duration, 4.5);
        assert_eq!(p.size, 13.0);
        assert_eq!(p.color, PALETTE[2]);
        assert_eq!(p.rotate, 180.0);
    }

    #[test]
    fn every_palette_entry_is_reachable() {
        let mut rng = RngSource(StdRng::seed_from_u64(3));
        let batch = generate_batch(400, &mut rng);
        for color in PALETTE {
            assert!(batch.iter().any(|p| p.color == color), "missing {}", color);
        }
    }
}
