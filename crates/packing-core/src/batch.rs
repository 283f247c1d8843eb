use crate::engine::SolvingEngine;
use crate::search::{SearchConfig, SearchDriver};
use crate::types::*;
use rayon::prelude::*;
use tracing::info;

#[cfg(test)]
mod tests;

/// Solves every instance independently and in parallel, keeping input order.
///
/// `engine_factory` is called once per instance so that no engine is shared between
/// concurrent searches.
pub fn solve_batch<E, F>(
    instances: &[Instance],
    config: &SearchConfig,
    engine_factory: F,
) -> Vec<PackingResult>
where
    E: SolvingEngine,
    F: Fn(&Instance) -> E + Sync,
{
    info!("Solving {} instance(s)", instances.len());

    let results: Vec<PackingResult> = instances
        .par_iter()
        .map(|instance| {
            let mut driver = SearchDriver::new(engine_factory(instance), config.clone());
            driver.solve(instance)
        })
        .collect();

    let solved = results.iter().filter(|r| r.is_solved()).count();
    info!("Solved {}/{} instance(s)", solved, results.len());
    results
}
