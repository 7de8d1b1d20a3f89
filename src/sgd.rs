/// Path-guided stochastic gradient descent in one dimension.
///
/// Positions every node on a line so that, over sampled pairs of
/// positions co-occurring on a path, layout distance approximates path
/// distance. The multi-threaded engine is deliberately lock-free and
/// lossy: workers race on per-slot atomic doubles and the optimizer
/// tolerates missed updates. A deterministic single-threaded variant
/// exists for reproducible runs.
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

use crate::error::{SortError, SortResult};
use crate::graph::{BidirectedGraph, Handle};
use crate::order::order_by_layout;
use crate::sampler::{SampleSpace, Term, TermSampler};
use crate::schedule::path_linear_sgd_schedule;
use crate::xp::PathIndex;

fn f64_to_u64(f: f64) -> u64 {
    f.to_bits()
}

fn u64_to_f64(u: u64) -> f64 {
    f64::from_bits(u)
}

/// Engine parameters; see the field docs for the roles they play.
#[derive(Debug, Clone)]
pub struct PathSGDParams {
    /// Maximum number of iterations.
    pub iter_max: u64,
    /// Iteration at which the learning rate peaks.
    pub iter_with_max_learning_rate: u64,
    /// Updates the supervisor requires before rotating the iteration.
    pub min_term_updates: u64,
    /// Convergence threshold on the largest observed update.
    pub delta: f64,
    /// Scales the final learning rate.
    pub eps: f64,
    /// Peak learning rate; also fixes w_min = 1/eta_max.
    pub eta_max: f64,
    /// Zipfian skew of the jump-length distribution.
    pub theta: f64,
    /// Upper bound of the Zipfian jump support.
    pub space: u64,
    /// Worker count for the multi-threaded engine.
    pub nthreads: usize,
    /// Select the single-threaded reproducible engine.
    pub deterministic: bool,
    /// Seed string for the deterministic engine.
    pub seed: Option<String>,
    /// Sample term starts uniformly from path nucleotides.
    pub sample_from_paths: bool,
    /// Sample term starts uniformly from nodes; overrides
    /// `sample_from_paths`.
    pub sample_from_nodes: bool,
    /// Capture the layout once per iteration.
    pub snapshot: bool,
    /// Emit one progress line per iteration to standard error.
    pub progress: bool,
}

impl Default for PathSGDParams {
    fn default() -> Self {
        PathSGDParams {
            iter_max: 100,
            iter_with_max_learning_rate: 0,
            min_term_updates: 1000,
            delta: 0.0,
            eps: 0.01,
            eta_max: 100.0,
            theta: 0.99,
            space: 100,
            nthreads: 1,
            deterministic: false,
            seed: None,
            sample_from_paths: true,
            sample_from_nodes: false,
            snapshot: false,
            progress: false,
        }
    }
}

impl PathSGDParams {
    pub fn sample_space(&self) -> SampleSpace {
        SampleSpace::from_flags(self.sample_from_paths, self.sample_from_nodes)
    }

    pub fn validate(&self) -> SortResult<()> {
        if self.iter_max < 1 {
            return Err(SortError::InvalidParameter(
                "iter_max must be at least 1".to_string(),
            ));
        }
        if self.iter_with_max_learning_rate >= self.iter_max {
            return Err(SortError::InvalidParameter(format!(
                "iter_with_max_learning_rate must lie in [0, {})",
                self.iter_max
            )));
        }
        if self.min_term_updates < 1 {
            return Err(SortError::InvalidParameter(
                "min_term_updates must be at least 1".to_string(),
            ));
        }
        if self.space < 1 {
            return Err(SortError::InvalidParameter(
                "space must be at least 1".to_string(),
            ));
        }
        if !(self.eps > 0.0) {
            return Err(SortError::InvalidParameter(
                "eps must be positive".to_string(),
            ));
        }
        if !(self.eta_max > 0.0) {
            return Err(SortError::InvalidParameter(
                "eta_max must be positive".to_string(),
            ));
        }
        if !(self.theta > 0.0) {
            return Err(SortError::InvalidParameter(
                "theta must be positive".to_string(),
            ));
        }
        if self.nthreads < 1 {
            return Err(SortError::InvalidParameter(
                "nthreads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Seed the layout with the graph order: nodes laid end to end along the
/// native traversal, each starting where the previous one ends.
fn initialize_layout(graph: &BidirectedGraph) -> Vec<AtomicU64> {
    let mut x = Vec::with_capacity(graph.node_count());
    let mut len = 0u64;
    for handle in graph.handles() {
        x.push(AtomicU64::new(f64_to_u64(len as f64)));
        len += graph.get_length(handle) as u64;
    }
    x
}

fn copy_layout(x: &[AtomicU64]) -> Vec<f64> {
    x.iter()
        .map(|slot| u64_to_f64(slot.load(Ordering::Relaxed)))
        .collect()
}

/// One SGD step on a sampled term. Loads both coordinates, moves them
/// half the weighted discrepancy toward (or away from) each other, and
/// returns the absolute correction. The store is a plain load-then-store
/// per coordinate, not a compare-and-swap: concurrent writers to the
/// same slot may lose updates, and the optimizer tolerates that.
#[inline]
fn apply_term_update(x: &[AtomicU64], term: Term, eta: f64) -> f64 {
    let w_ij = 1.0 / term.d_ij;
    let mut mu = eta * w_ij;
    if mu > 1.0 {
        mu = 1.0;
    }
    let x_i = u64_to_f64(x[term.i].load(Ordering::Relaxed));
    let x_j = u64_to_f64(x[term.j].load(Ordering::Relaxed));
    let mut dx = x_i - x_j;
    if dx == 0.0 {
        dx = 1e-9; // avoid nan
    }
    let mag = dx.abs();
    let delta = mu * (mag - term.d_ij) / 2.0;
    let r = delta / mag;
    let r_x = r * dx;
    x[term.i].store(
        f64_to_u64(u64_to_f64(x[term.i].load(Ordering::Relaxed)) - r_x),
        Ordering::Relaxed,
    );
    x[term.j].store(
        f64_to_u64(u64_to_f64(x[term.j].load(Ordering::Relaxed)) + r_x),
        Ordering::Relaxed,
    );
    delta.abs()
}

fn progress_line(iteration: u64, iter_max: u64, eta: f64, delta_max: f64, updates: u64) {
    let percent = iteration as f64 / iter_max as f64 * 100.0;
    eprintln!(
        "[path sgd sort] {:.2}% progress: iteration: {}, eta: {}, delta_max: {}, number of updates: {}",
        percent, iteration, eta, delta_max, updates
    );
}

fn converged_line(delta_max: f64, delta: f64) {
    eprintln!(
        "[path sgd sort] delta_max: {} <= delta: {}. Threshold reached, ending iterations.",
        delta_max, delta
    );
}

/// Multi-threaded path-guided SGD. Returns the final layout and, when
/// snapshotting is enabled, one layout copy per completed iteration.
///
/// Concurrency layout: `nthreads` workers race on the shared positions,
/// one checker thread owns the iteration counter and the learning-rate
/// rotation, and one snapshot thread copies the positions whenever the
/// iteration advances. The three kinds of thread communicate only
/// through atomics; the checker's `work_todo` store is the single
/// cancellation signal.
pub fn path_linear_sgd(
    graph: &BidirectedGraph,
    index: &PathIndex,
    use_paths: &[usize],
    params: &PathSGDParams,
) -> SortResult<(Vec<f64>, Vec<Vec<f64>>)> {
    params.validate()?;
    let sampler = TermSampler::new(
        graph,
        index,
        use_paths,
        params.sample_space(),
        params.space,
        params.theta,
    )?;
    let x = initialize_layout(graph);

    let w_min = 1.0 / params.eta_max;
    let w_max = 1.0;
    let etas = path_linear_sgd_schedule(
        w_min,
        w_max,
        params.iter_max,
        params.iter_with_max_learning_rate,
        params.eps,
    );

    let term_updates = AtomicU64::new(0);
    let iteration = AtomicU64::new(0);
    let eta = AtomicU64::new(f64_to_u64(etas[0]));
    let delta_max = AtomicU64::new(f64_to_u64(0.0));
    let work_todo = AtomicBool::new(true);

    // workers seed from wall-clock seconds and their ordinal
    let wall_seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    log::debug!(
        "path sgd: {} nodes, {} paths, {} threads, {} iterations",
        graph.node_count(),
        use_paths.len(),
        params.nthreads,
        params.iter_max
    );

    let (snapshots, worker_results) = thread::scope(|scope| {
        let x = &x;
        let sampler = &sampler;
        let etas = &etas;
        let term_updates = &term_updates;
        let iteration = &iteration;
        let eta = &eta;
        let delta_max = &delta_max;
        let work_todo = &work_todo;

        let checker = scope.spawn(move || {
            while work_todo.load(Ordering::Relaxed) {
                let curr_updates = term_updates.load(Ordering::Relaxed);
                if curr_updates > params.min_term_updates {
                    let iter = iteration.fetch_add(1, Ordering::Relaxed) + 1;
                    if iter > params.iter_max {
                        work_todo.store(false, Ordering::Release);
                    } else if u64_to_f64(delta_max.load(Ordering::Relaxed)) <= params.delta {
                        if params.progress {
                            converged_line(
                                u64_to_f64(delta_max.load(Ordering::Relaxed)),
                                params.delta,
                            );
                        }
                        work_todo.store(false, Ordering::Release);
                    } else {
                        if params.progress {
                            progress_line(
                                iter,
                                params.iter_max,
                                u64_to_f64(eta.load(Ordering::Relaxed)),
                                u64_to_f64(delta_max.load(Ordering::Relaxed)),
                                curr_updates,
                            );
                        }
                        if (iter as usize) < etas.len() {
                            eta.store(f64_to_u64(etas[iter as usize]), Ordering::Relaxed);
                        }
                        delta_max.store(f64_to_u64(params.delta), Ordering::Relaxed);
                    }
                    term_updates.store(0, Ordering::Relaxed);
                }
                thread::sleep(Duration::from_millis(1));
            }
        });

        let snapshotter = scope.spawn(move || {
            let mut captured_iter = 0u64;
            let mut snapshots: Vec<Vec<f64>> = Vec::new();
            while work_todo.load(Ordering::Acquire) {
                let iter = iteration.load(Ordering::Relaxed);
                if params.snapshot && captured_iter < iter && iter != params.iter_max {
                    // unsynchronized with the workers; a snapshot may mix
                    // coordinates from adjacent updates
                    snapshots.push(copy_layout(x));
                    captured_iter = iter;
                }
                thread::sleep(Duration::from_millis(1));
            }
            snapshots
        });

        let workers: Vec<_> = (0..params.nthreads)
            .map(|tid| {
                scope.spawn(move || -> SortResult<()> {
                    let seed = wall_seed ^ (tid as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
                    let mut rng = Xoshiro256Plus::seed_from_u64(seed);
                    while work_todo.load(Ordering::Acquire) {
                        let term = match sampler.sample(&mut rng) {
                            Ok(Some(term)) => term,
                            Ok(None) => continue,
                            Err(e) => {
                                // fatal: bring the whole engine down
                                work_todo.store(false, Ordering::Release);
                                return Err(e);
                            }
                        };
                        let delta_abs =
                            apply_term_update(x, term, u64_to_f64(eta.load(Ordering::Relaxed)));
                        // racy maximum; may briefly regress under
                        // contention, so the supervisor treats it as a
                        // noisy upper bound
                        while delta_abs > u64_to_f64(delta_max.load(Ordering::Relaxed)) {
                            delta_max.store(f64_to_u64(delta_abs), Ordering::Relaxed);
                        }
                        term_updates.fetch_add(1, Ordering::Relaxed);
                    }
                    Ok(())
                })
            })
            .collect();

        let mut results = Vec::with_capacity(params.nthreads);
        for worker in workers {
            results.push(worker.join().expect("sgd worker panicked"));
        }
        work_todo.store(false, Ordering::Release);
        let snapshots = snapshotter.join().expect("snapshot thread panicked");
        checker.join().expect("checker thread panicked");
        (snapshots, results)
    });

    for result in worker_results {
        result?;
    }

    log::debug!(
        "path sgd finished after {} iterations",
        iteration.load(Ordering::Relaxed)
    );
    Ok((copy_layout(&x), snapshots))
}

fn fold_seed(bytes: &[u8]) -> u64 {
    // FNV-1a over the seed string
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        h ^= b as u64;
        h = h.wrapping_mul(0x1_0000_0000_01b3);
    }
    h
}

/// Single-threaded reproducible engine. Runs exactly `iter_max`
/// iterations of `min_term_updates` sampling steps each, unless the
/// convergence threshold fires between iterations. Identical inputs and
/// seed produce identical layouts and snapshots.
pub fn deterministic_path_linear_sgd(
    graph: &BidirectedGraph,
    index: &PathIndex,
    use_paths: &[usize],
    params: &PathSGDParams,
) -> SortResult<(Vec<f64>, Vec<Vec<f64>>)> {
    params.validate()?;
    let sampler = TermSampler::new(
        graph,
        index,
        use_paths,
        params.sample_space(),
        params.space,
        params.theta,
    )?;
    let x = initialize_layout(graph);

    let w_min = 1.0 / params.eta_max;
    let w_max = 1.0;
    let etas = path_linear_sgd_schedule(
        w_min,
        w_max,
        params.iter_max,
        params.iter_with_max_learning_rate,
        params.eps,
    );

    let seed = params.seed.as_deref().unwrap_or("pathsort");
    let mut rng = Xoshiro256Plus::seed_from_u64(fold_seed(seed.as_bytes()));

    let mut eta = etas[0];
    let mut delta_max = 0.0f64;
    let mut term_updates = 0u64;
    let mut snapshots: Vec<Vec<f64>> = Vec::new();

    for iteration in 0..params.iter_max {
        if params.snapshot && iteration + 1 < params.iter_max {
            snapshots.push(copy_layout(&x));
        }
        for _ in 0..params.min_term_updates {
            let term = match sampler.sample(&mut rng)? {
                Some(term) => term,
                None => continue,
            };
            let delta_abs = apply_term_update(&x, term, eta);
            if delta_abs > delta_max {
                delta_max = delta_abs;
            }
            term_updates += 1;
        }
        if delta_max <= params.delta {
            if params.progress {
                converged_line(delta_max, params.delta);
            }
            break;
        } else {
            if params.progress {
                progress_line(iteration + 1, params.iter_max, eta, delta_max, term_updates);
            }
            // the final iteration has no successor rate to rotate to
            if iteration + 1 < params.iter_max {
                eta = etas[(iteration + 1) as usize];
                delta_max = params.delta;
            }
        }
        term_updates = 0;
    }

    Ok((copy_layout(&x), snapshots))
}

/// Run the engine selected by `params` and project the resulting layout
/// (and each snapshot) to a total node ordering grouped by weakly
/// connected component.
pub fn path_linear_sgd_order(
    graph: &BidirectedGraph,
    index: &PathIndex,
    use_paths: &[usize],
    params: &PathSGDParams,
) -> SortResult<(Vec<Handle>, Vec<Vec<Handle>>)> {
    let (layout, snapshot_layouts) = if params.deterministic {
        deterministic_path_linear_sgd(graph, index, use_paths, params)?
    } else {
        path_linear_sgd(graph, index, use_paths, params)?
    };
    let order = order_by_layout(graph, &layout);
    let snapshot_orders = snapshot_layouts
        .iter()
        .map(|snapshot| order_by_layout(graph, snapshot))
        .collect();
    Ok((order, snapshot_orders))
}
