//! End-to-end tests for the Hogwild SGD launch

use factr::prelude::*;

fn uniform_factors(rows: usize, k: usize, value: f32) -> Vec<f32> {
    vec![value; rows * k]
}

/// Small deterministic per-element variation so the dimensions receive
/// distinct gradients (a constant init would pin every dimension to the
/// same trajectory and cap the model at rank 1).
fn varied_factors(rows: usize, k: usize) -> Vec<f32> {
    (0..rows * k)
        .map(|i| 0.05 + ((i * 37 + 11) % 97) as f32 * 0.002)
        .collect()
}

/// Small deterministic rating set over `users x items`
fn grid_interactions(users: u32, items: u32) -> Vec<Interaction> {
    let mut out = Vec::new();
    for u in 0..users {
        for v in 0..items {
            let rating = ((u * 7 + v * 3) % 5 + 1) as f32;
            out.push(Interaction::new(u, v, rating));
        }
    }
    out
}

fn mse(interactions: &[Interaction], p: &[f32], q: &[f32], k: usize) -> f64 {
    let mut total = 0.0f64;
    for node in interactions {
        let bp = node.user as usize * k;
        let bq = node.item as usize * k;
        let pred: f32 = (0..k).map(|j| p[bp + j] * q[bq + j]).sum();
        total += f64::from(node.rating - pred).powi(2);
    }
    total / interactions.len() as f64
}

#[test]
fn test_full_precision_matches_closed_form() {
    // Single interaction (u=0, v=0, r=5.0), k=64, all factors 1.0:
    // pred = 64, residual = -59, p'[j] = 1 + lr*(residual*q[j] - lambda*p[j]).
    let k = 64;
    let interactions = vec![Interaction::new(0, 0, 5.0)];
    let mut p = uniform_factors(1, k, 1.0);
    let mut q = uniform_factors(1, k, 1.0);
    let mut rngs = WorkerRng::seed_workers(0, 1);
    let mut stats = SgdStats::new(1, k);

    let mut config = SgdConfig::new(k);
    config.learning_rate = 0.01;
    config.lambda = 0.01;
    config.update_count_this_block = 1;
    config.update_vector_size = 1;

    sgd_launch(&interactions, &mut p, &mut q, &mut rngs, &config, &mut stats).unwrap();

    let expected = 1.0f32 + 0.01 * (-59.0f32 * 1.0 - 0.01 * 1.0);
    for j in 0..k {
        assert_eq!(p[j], expected, "p[{j}]");
        assert_eq!(q[j], expected, "q[{j}]");
    }

    // Full precision: the statistics gate stays closed.
    assert_eq!(stats.sum_norms[0], 0.0);
    assert!(stats.updated_val().iter().all(|&v| v == 0.0));
}

#[test]
fn test_full_precision_training_converges() {
    let k = 64;
    let interactions = grid_interactions(4, 4);
    let mut p = varied_factors(4, k);
    let mut q = varied_factors(4, k);
    let mut rngs = WorkerRng::seed_workers(42, 4);
    let mut stats = SgdStats::new(4, k);

    let mut config = SgdConfig::new(k);
    config.learning_rate = 0.005;
    config.lambda = 0.001;
    config.update_count_this_block = 8;
    config.update_vector_size = 16;

    let initial = mse(&interactions, &p, &q, k);
    for _ in 0..50 {
        stats.reset();
        sgd_launch(&interactions, &mut p, &mut q, &mut rngs, &config, &mut stats).unwrap();
    }
    let trained = mse(&interactions, &p, &q, k);

    assert!(initial > 1.0, "initial mse = {initial}");
    assert!(trained < 0.1, "trained mse = {trained}");
}

#[test]
fn test_reduced_precision_training_converges() {
    let k = 64;
    let interactions = grid_interactions(4, 4);
    let mut p = varied_factors(4, k);
    let mut q = varied_factors(4, k);
    let mut rngs = WorkerRng::seed_workers(7, 4);
    let mut stats = SgdStats::new(4, k);

    let mut config = SgdConfig::new(k);
    config.learning_rate = 0.005;
    config.lambda = 0.001;
    config.update_count_this_block = 8;
    config.update_vector_size = 16;
    config.forward = Precision::Half;
    config.backward = Precision::Half;
    config.rounding = Rounding::Stochastic;

    let initial = mse(&interactions, &p, &q, k);
    for _ in 0..50 {
        stats.reset();
        sgd_launch(&interactions, &mut p, &mut q, &mut rngs, &config, &mut stats).unwrap();
    }
    let trained = mse(&interactions, &p, &q, k);

    assert!(trained < initial * 0.2, "initial={initial} trained={trained}");
}

#[test]
fn test_statistics_collected_at_reduced_precision() {
    let k = 64;
    let interactions = grid_interactions(3, 3);
    let mut p = uniform_factors(3, k, 0.2);
    let mut q = uniform_factors(3, k, 0.2);
    let mut rngs = WorkerRng::seed_workers(1, 2);
    let mut stats = SgdStats::new(2, k);

    let mut config = SgdConfig::new(k);
    config.update_count_this_block = 4;
    config.update_vector_size = 8;
    config.forward = Precision::Int8;
    config.backward = Precision::Int8;

    sgd_launch(&interactions, &mut p, &mut q, &mut rngs, &config, &mut stats).unwrap();

    assert!(stats.sum_norms.iter().all(|&n| n > 0.0), "{:?}", stats.sum_norms);
    assert!(stats.updated_val().iter().any(|&v| v != 0.0));
}

#[test]
fn test_statistics_warmup_skips_everything() {
    let k = 64;
    let interactions = grid_interactions(3, 3);
    let mut p = uniform_factors(3, k, 0.2);
    let mut q = uniform_factors(3, k, 0.2);
    let mut rngs = WorkerRng::seed_workers(1, 2);
    let mut stats = SgdStats::new(2, k);

    let mut config = SgdConfig::new(k);
    config.update_count_this_block = 4;
    config.update_vector_size = 8;
    config.forward = Precision::Int8;
    config.backward = Precision::Int8;
    // Warm-up threshold at the total processed count: nothing qualifies.
    config.first_sample_rating_idx = (4 * 8) as u32;

    sgd_launch(&interactions, &mut p, &mut q, &mut rngs, &config, &mut stats).unwrap();

    assert!(stats.sum_norms.iter().all(|&n| n == 0.0));
    assert!(stats.updated_val().iter().all(|&v| v == 0.0));
}

#[test]
fn test_launch_validation() {
    let k = 64;
    let interactions = vec![Interaction::new(0, 0, 1.0)];
    let mut p = uniform_factors(1, k, 0.1);
    let mut q = uniform_factors(1, k, 0.1);
    let mut rngs = WorkerRng::seed_workers(0, 1);
    let mut stats = SgdStats::new(1, k);
    let config = SgdConfig::new(k);

    // k not a multiple of the lane width
    let bad = SgdConfig::new(48);
    assert!(matches!(
        sgd_launch(&interactions, &mut p, &mut q, &mut rngs, &bad, &mut stats),
        Err(Error::InvalidArgument { arg: "k", .. })
    ));

    // empty interaction stream
    assert!(sgd_launch(&[], &mut p, &mut q, &mut rngs, &config, &mut stats).is_err());

    // factor array not a multiple of k
    let mut short_p = vec![0.1f32; k - 1];
    assert!(matches!(
        sgd_launch(&interactions, &mut short_p, &mut q, &mut rngs, &config, &mut stats),
        Err(Error::FactorShape { name: "p", .. })
    ));

    // interaction addressing a missing row
    let oob = vec![Interaction::new(5, 0, 1.0)];
    assert!(matches!(
        sgd_launch(&oob, &mut p, &mut q, &mut rngs, &config, &mut stats),
        Err(Error::RowOutOfBounds { side: "user", .. })
    ));

    // worker-count mismatch between RNG states and norm slots
    let mut two_rngs = WorkerRng::seed_workers(0, 2);
    assert!(matches!(
        sgd_launch(&interactions, &mut p, &mut q, &mut two_rngs, &config, &mut stats),
        Err(Error::WorkerMismatch { .. })
    ));

    // stats width must equal k
    let mut bad_stats = SgdStats::new(1, 32);
    assert!(matches!(
        sgd_launch(&interactions, &mut p, &mut q, &mut rngs, &config, &mut bad_stats),
        Err(Error::InvalidArgument { arg: "stats", .. })
    ));
}

#[test]
fn test_factor_state_persists_across_launches() {
    let k = 64;
    let interactions = vec![Interaction::new(0, 0, 4.0)];
    let mut p = uniform_factors(1, k, 0.5);
    let mut q = uniform_factors(1, k, 0.5);
    let mut rngs = WorkerRng::seed_workers(3, 1);
    let mut stats = SgdStats::new(1, k);

    let mut config = SgdConfig::new(k);
    config.update_count_this_block = 1;
    config.update_vector_size = 1;

    sgd_launch(&interactions, &mut p, &mut q, &mut rngs, &config, &mut stats).unwrap();
    let after_one = p[0];
    sgd_launch(&interactions, &mut p, &mut q, &mut rngs, &config, &mut stats).unwrap();

    // Second launch continues from the mutated state.
    assert_ne!(p[0], after_one);
    assert_ne!(after_one, 0.5);
}
