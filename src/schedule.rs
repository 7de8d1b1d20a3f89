/// Learning-rate schedule for the SGD engine.
///
/// Produces one rate per iteration: an exponential decay away from a
/// designated peak iteration, from eta_max = 1/w_min down toward
/// eta_min = eps/w_max on both sides.
pub fn path_linear_sgd_schedule(
    w_min: f64,
    w_max: f64,
    iter_max: u64,
    iter_with_max_learning_rate: u64,
    eps: f64,
) -> Vec<f64> {
    let eta_max = 1.0 / w_min;
    let eta_min = eps / w_max;
    // a single iteration has no decay to distribute
    let lambda = if iter_max > 1 {
        (eta_max / eta_min).ln() / (iter_max as f64 - 1.0)
    } else {
        0.0
    };
    let peak = iter_with_max_learning_rate as i64;
    (0..iter_max)
        .map(|t| eta_max * (-lambda * (t as i64 - peak).abs() as f64).exp())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peaks_at_designated_iteration() {
        // w_min=0.1, w_max=1, T=5, peak=2, eps=0.01
        let etas = path_linear_sgd_schedule(0.1, 1.0, 5, 2, 0.01);
        assert_eq!(etas.len(), 5);
        assert!((etas[2] - 10.0).abs() < 1e-12);
        // symmetric around the peak
        assert!((etas[1] - etas[3]).abs() < 1e-12);
        assert!((etas[0] - etas[4]).abs() < 1e-12);
        for &eta in &etas {
            assert!(eta > 0.0);
            assert!(eta <= etas[2]);
        }
    }

    #[test]
    fn monotone_decay_on_both_sides_of_peak() {
        let etas = path_linear_sgd_schedule(0.01, 1.0, 20, 5, 0.1);
        for t in 0..5 {
            assert!(etas[t] <= etas[t + 1]);
        }
        for t in 5..19 {
            assert!(etas[t] >= etas[t + 1]);
        }
    }

    #[test]
    fn single_iteration_schedule_is_eta_max() {
        let etas = path_linear_sgd_schedule(1.0, 1.0, 1, 0, 0.01);
        assert_eq!(etas, vec![1.0]);
    }

    #[test]
    fn regeneration_is_bitwise_identical() {
        let a = path_linear_sgd_schedule(0.01, 1.0, 100, 10, 0.01);
        let b = path_linear_sgd_schedule(0.01, 1.0, 100, 10, 0.01);
        assert_eq!(a, b);
    }
}
