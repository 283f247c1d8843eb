use super::{Assignment, SolvingEngine, Verdict};
use crate::model::{EncodingStrategy, Model};
use crate::types::*;
use splr::{Certificate, Config, SolveIF, Solver, SolverError};
use std::time::Duration;
use tracing::debug;

/// splr only checks its limit in whole seconds, truncating any fraction.
pub(crate) fn splr_timeout(budget: Duration) -> f64 {
    budget.as_secs_f64().ceil().max(1.0)
}

/// In-process CDCL engine for CNF models.
#[derive(Debug, Default)]
pub struct SatEngine;

impl SatEngine {
    pub fn new() -> Self {
        Self
    }
}

impl SolvingEngine for SatEngine {
    fn name(&self) -> &str {
        "splr"
    }

    fn supports_minimize(&self) -> bool {
        false
    }

    fn supports(&self, family: EncodingStrategy) -> bool {
        family == EncodingStrategy::OrderSat
    }

    fn solve(&mut self, model: &Model, budget: Duration) -> Result<Verdict> {
        let Model::Cnf(cnf) = model else {
            return Err(PackingError::UnsupportedModel {
                engine: self.name().to_string(),
                family: model.family().to_string(),
            });
        };

        if cnf.is_contradiction() {
            return Ok(Verdict::Infeasible);
        }
        if budget.is_zero() {
            return Ok(Verdict::TimedOut);
        }

        let config = Config {
            c_timeout: splr_timeout(budget),
            ..Config::default()
        };

        let mut solver = match Solver::try_from((config, cnf.clauses())) {
            Ok(solver) => solver,
            // Refuted while loading the clauses.
            Err(Ok(Certificate::UNSAT)) => return Ok(Verdict::Infeasible),
            Err(Ok(Certificate::SAT(model))) => {
                return Ok(Verdict::Feasible(Assignment::Literals(model)))
            }
            Err(Err(err)) => return Err(PackingError::Engine(format!("{err:?}"))),
        };

        match solver.solve() {
            Ok(Certificate::SAT(model)) => Ok(Verdict::Feasible(Assignment::Literals(model))),
            Ok(Certificate::UNSAT) => Ok(Verdict::Infeasible),
            Err(SolverError::TimeOut) => {
                debug!("splr hit its {:.1}s timeout", budget.as_secs_f64());
                Ok(Verdict::TimedOut)
            }
            Err(SolverError::EmptyClause) => Ok(Verdict::Infeasible),
            Err(err) => Err(PackingError::Engine(format!("{err:?}"))),
        }
    }
}
