use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Radius beyond which a synthetic star contributes nothing.
const STAR_RADIUS: isize = 3;

/// Zero-background image with `n_stars` Gaussian stars (sigma 1 px) at
/// seeded random positions.
///
/// Each star covers a disc of radius 3 pixels, so every pixel outside those
/// discs is exactly zero.
pub fn synthetic_star_field(rows: usize, cols: usize, n_stars: usize, seed: u64) -> Array2<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut image = Array2::zeros((rows, cols));
    if rows == 0 || cols == 0 {
        return image;
    }

    for _ in 0..n_stars {
        let cy = rng.random_range(0..rows) as isize;
        let cx = rng.random_range(0..cols) as isize;
        let peak = rng.random_range(100.0..5000.0);

        for dy in -STAR_RADIUS..=STAR_RADIUS {
            for dx in -STAR_RADIUS..=STAR_RADIUS {
                let r2 = (dx * dx + dy * dy) as f64;
                if r2 > (STAR_RADIUS * STAR_RADIUS) as f64 {
                    continue;
                }
                let (y, x) = (cy + dy, cx + dx);
                if y < 0 || x < 0 || y >= rows as isize || x >= cols as isize {
                    continue;
                }
                image[[y as usize, x as usize]] += peak * (-r2 / 2.0).exp();
            }
        }
    }

    image
}
