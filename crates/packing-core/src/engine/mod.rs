//! Solving engines behind a common interface.
//!
//! The search driver only sees [`SolvingEngine`]: it hands over a [`Model`] and a time
//! budget and gets back a [`Verdict`]. [`SatEngine`] runs CNF models in process,
//! [`SmtLibEngine`] hands arithmetic models to an external SMT solver.

use crate::model::{EncodingStrategy, Model};
use crate::types::*;
use std::collections::BTreeMap;
use std::time::Duration;

mod sat;
mod smtlib;

pub use sat::SatEngine;
pub use smtlib::{SmtLibEngine, SmtSolver};

/// Values reported by an engine for a satisfiable model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    /// DIMACS literals, `v` for true and `-v` for false.
    Literals(Vec<i32>),
    /// Variable name to value, booleans as 0/1.
    Named(BTreeMap<String, i64>),
}

impl Assignment {
    /// Truth value of a boolean variable, `None` if the engine did not report it.
    pub fn literal(&self, var: i32) -> Option<bool> {
        match self {
            Self::Literals(lits) => {
                let index = usize::try_from(var.checked_sub(1)?).ok()?;
                // Engines report literals in variable order.
                match lits.get(index) {
                    Some(&lit) if lit.abs() == var => Some(lit > 0),
                    _ => lits.iter().find(|l| l.abs() == var).map(|&l| l > 0),
                }
            }
            Self::Named(_) => None,
        }
    }

    pub fn value(&self, name: &str) -> Option<i64> {
        match self {
            Self::Named(values) => values.get(name).copied(),
            Self::Literals(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Feasible(Assignment),
    Infeasible,
    TimedOut,
}

/// A solver that answers one model at a time.
pub trait SolvingEngine {
    fn name(&self) -> &str;

    /// Whether the engine can minimise the plate height of a parametric model.
    fn supports_minimize(&self) -> bool;

    fn supports(&self, family: EncodingStrategy) -> bool;

    /// Solves `model` within `budget`. A model whose height objective is set must come
    /// back optimal; a partial answer at the deadline is reported as `TimedOut`.
    fn solve(&mut self, model: &Model, budget: Duration) -> Result<Verdict>;
}

impl<E: SolvingEngine + ?Sized> SolvingEngine for Box<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn supports_minimize(&self) -> bool {
        (**self).supports_minimize()
    }

    fn supports(&self, family: EncodingStrategy) -> bool {
        (**self).supports(family)
    }

    fn solve(&mut self, model: &Model, budget: Duration) -> Result<Verdict> {
        (**self).solve(model, budget)
    }
}

/// Engine selection as it appears in configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub kind: EngineKind,
    /// Solver binary, defaults to the solver's usual name on `PATH`.
    #[serde(default)]
    pub binary: Option<std::path::PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineKind {
    #[default]
    Sat,
    Z3,
    Cvc5,
}

impl EngineConfig {
    /// Engine suited to the encoding family, regardless of the configured kind.
    pub fn for_family(&self, family: EncodingStrategy) -> EngineConfig {
        match (family, self.kind) {
            (EncodingStrategy::OrderSat, _) => EngineConfig {
                kind: EngineKind::Sat,
                binary: None,
            },
            (_, EngineKind::Sat) => EngineConfig {
                kind: EngineKind::Z3,
                binary: self.binary.clone(),
            },
            _ => self.clone(),
        }
    }

    pub fn build(&self) -> Box<dyn SolvingEngine + Send> {
        match self.kind {
            EngineKind::Sat => Box::new(SatEngine::new()),
            EngineKind::Z3 => Box::new(SmtLibEngine::new(SmtSolver::Z3, self.binary.clone())),
            EngineKind::Cvc5 => {
                Box::new(SmtLibEngine::new(SmtSolver::Cvc5, self.binary.clone()))
            }
        }
    }
}
