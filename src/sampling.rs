use rand::prelude::*;
use rand_distr::StandardNormal;

/// Rate above which the Poisson sampler switches to the normal approximation.
///
/// Knuth's method needs `exp(-lambda)`, which underflows for large rates.
const POISSON_NORMAL_THRESHOLD: f64 = 100.0;

/// Sample a Poisson-distributed count with mean `lambda` from `rng`.
///
/// Non-positive rates return 0 without drawing.
pub fn poisson<R: Rng + ?Sized>(rng: &mut R, lambda: f64) -> usize {
    if lambda <= 0.0 {
        return 0;
    }

    if lambda > POISSON_NORMAL_THRESHOLD {
        // Normal approximation with continuity correction.
        let z: f64 = StandardNormal.sample(rng);
        let val = z * lambda.sqrt() + lambda + 0.5;
        return val.max(0.0) as usize;
    }

    let lim = (-lambda).exp();
    let mut n_iter = 0;
    let mut prod = 1.0;
    loop {
        n_iter += 1;
        prod *= rng.random::<f64>();
        if prod <= lim {
            return n_iter - 1;
        }
    }
}

/// Sample a binomially distributed count of successes out of `n` trials.
pub fn binomial<R: Rng + ?Sized>(rng: &mut R, n: usize, p: f64) -> usize {
    if n == 0 || p <= 0.0 {
        return 0;
    }
    if p >= 1.0 {
        return n;
    }
    (0..n).filter(|_| rng.random::<f64>() < p).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha12Rng;

    fn sample_mean(n_draws: usize, mut draw: impl FnMut() -> usize) -> f64 {
        (0..n_draws).map(|_| draw() as f64).sum::<f64>() / n_draws as f64
    }

    #[test]
    fn poisson_of_non_positive_rate_is_zero() {
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(poisson(&mut rng, 0.0), 0);
            assert_eq!(poisson(&mut rng, -3.5), 0);
        }
    }

    #[test]
    fn poisson_small_rate_mean() {
        let mut rng = ChaCha12Rng::seed_from_u64(2);
        let lambda = 4.0;
        let mean = sample_mean(50_000, || poisson(&mut rng, lambda));
        // Standard error is 2 / sqrt(50_000) ~ 0.009.
        assert!((mean - lambda).abs() < 0.05, "mean = {mean}");
    }

    #[test]
    fn poisson_large_rate_mean() {
        let mut rng = ChaCha12Rng::seed_from_u64(3);
        let lambda = 400.0;
        let mean = sample_mean(20_000, || poisson(&mut rng, lambda));
        // Standard error is 20 / sqrt(20_000) ~ 0.14; the continuity
        // correction adds at most 0.5 before truncation.
        assert!((mean - lambda).abs() < 1.0, "mean = {mean}");
    }

    #[test]
    fn poisson_at_threshold_uses_exact_method() {
        let mut rng = ChaCha12Rng::seed_from_u64(4);
        let mean = sample_mean(20_000, || poisson(&mut rng, POISSON_NORMAL_THRESHOLD));
        assert!((mean - POISSON_NORMAL_THRESHOLD).abs() < 0.5, "mean = {mean}");
    }

    #[test]
    fn binomial_edge_cases() {
        let mut rng = ChaCha12Rng::seed_from_u64(5);
        assert_eq!(binomial(&mut rng, 50, 0.0), 0);
        assert_eq!(binomial(&mut rng, 50, -0.1), 0);
        assert_eq!(binomial(&mut rng, 50, 1.0), 50);
        assert_eq!(binomial(&mut rng, 50, 1.5), 50);
        assert_eq!(binomial(&mut rng, 0, 0.5), 0);
        assert_eq!(binomial(&mut rng, 0, 1.0), 0);
    }

    #[test]
    fn binomial_mean_and_bounds() {
        let mut rng = ChaCha12Rng::seed_from_u64(6);
        let (n, p) = (40, 0.3);
        let mut sum = 0;
        let n_draws = 20_000;
        for _ in 0..n_draws {
            let k = binomial(&mut rng, n, p);
            assert!(k <= n);
            sum += k;
        }
        let mean = sum as f64 / n_draws as f64;
        assert!((mean - n as f64 * p).abs() < 0.1, "mean = {mean}");
    }
}
