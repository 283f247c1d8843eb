//! Height search over one instance.
//!
//! The driver either scans candidate heights from the lower bound upwards, asking the
//! engine for a feasibility verdict at each, or submits a single parametric model and
//! lets the engine minimise the height. Both share one time budget, tracked in
//! [`SearchState`].

use crate::bounds::Bounds;
use crate::decode::decode;
use crate::engine::{SolvingEngine, Verdict};
use crate::model::{EncodingStrategy, ModelBuilder, ModelOptions};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchMode {
    /// Optimize when the engine can minimise an arithmetic model, Scan otherwise.
    #[default]
    Auto,
    Scan,
    Optimize,
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Scan => write!(f, "scan"),
            Self::Optimize => write!(f, "optimize"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub encoding: EncodingStrategy,
    #[serde(default)]
    pub mode: SearchMode,
    /// Wall-clock budget for the whole instance.
    #[serde(default = "default_time_budget_secs")]
    pub time_budget_secs: f64,
    #[serde(default = "default_true")]
    pub symmetry_breaking: bool,
}

fn default_time_budget_secs() -> f64 {
    300.0
}

fn default_true() -> bool {
    true
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            encoding: EncodingStrategy::default(),
            mode: SearchMode::default(),
            time_budget_secs: default_time_budget_secs(),
            symmetry_breaking: true,
        }
    }
}

impl SearchConfig {
    /// Negative or NaN budgets count as no time at all.
    pub fn time_budget(&self) -> Duration {
        Duration::try_from_secs_f64(self.time_budget_secs.max(0.0)).unwrap_or(Duration::MAX)
    }

    pub fn model_options(&self) -> ModelOptions {
        ModelOptions {
            symmetry_breaking: self.symmetry_breaking,
        }
    }
}

/// Progress of the search on one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    pub current_height: u32,
    pub lower_bound: u32,
    pub upper_bound: u32,
    pub time_remaining: Duration,
    pub attempts: u32,
}

impl SearchState {
    pub fn new(bounds: Bounds, budget: Duration) -> Self {
        Self {
            current_height: bounds.lower,
            lower_bound: bounds.lower,
            upper_bound: bounds.upper,
            time_remaining: budget,
            attempts: 0,
        }
    }

    /// Deducts wall time spent in an attempt from the remaining budget.
    pub fn charge(&mut self, elapsed: Duration) {
        self.time_remaining = self.time_remaining.saturating_sub(elapsed);
    }

    pub fn is_out_of_time(&self) -> bool {
        self.time_remaining.is_zero()
    }
}

/// Runs the height search for one instance at a time with a single engine.
pub struct SearchDriver<E> {
    engine: E,
    config: SearchConfig,
}

impl<E: SolvingEngine> SearchDriver<E> {
    pub fn new(engine: E, config: SearchConfig) -> Self {
        Self { engine, config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The mode actually used once `Auto` is settled against the engine and encoding.
    pub fn effective_mode(&self) -> SearchMode {
        match self.config.mode {
            SearchMode::Auto
                if self.engine.supports_minimize()
                    && self.config.encoding.supports_parametric_height() =>
            {
                SearchMode::Optimize
            }
            SearchMode::Auto => SearchMode::Scan,
            mode => mode,
        }
    }

    /// Solves one instance. Every failure is reported through the result status.
    pub fn solve(&mut self, instance: &Instance) -> PackingResult {
        let started = Instant::now();
        let mut attempts = 0;
        let outcome = self.run(instance, &mut attempts);
        let elapsed = started.elapsed();

        match outcome {
            Ok(packing) => {
                info!(
                    "Instance '{}' solved at height {} after {} attempt(s) in {:.2}s",
                    instance.id,
                    packing.plate_height,
                    attempts,
                    elapsed.as_secs_f64()
                );
                PackingResult::solved(&instance.id, packing, elapsed, attempts)
            }
            Err(err) => {
                match &err {
                    PackingError::DecodeInvariantViolation(_) => {
                        error!("Instance '{}': {}", instance.id, err)
                    }
                    PackingError::Exhausted { .. } | PackingError::Engine(_) => {
                        warn!("Instance '{}': {}", instance.id, err)
                    }
                    _ => info!("Instance '{}': {}", instance.id, err),
                }
                PackingResult::unsolved(&instance.id, &err, elapsed, attempts)
            }
        }
    }

    fn run(&mut self, instance: &Instance, attempts: &mut u32) -> Result<Packing> {
        let bounds = Bounds::compute(instance)?;
        let builder = ModelBuilder::new(
            instance,
            self.config.encoding,
            self.config.model_options(),
        )?;

        if !self.engine.supports(self.config.encoding) {
            return Err(PackingError::UnsupportedModel {
                engine: self.engine.name().to_string(),
                family: self.config.encoding.to_string(),
            });
        }

        let mode = self.effective_mode();
        debug!(
            "Instance '{}': bounds [{}, {}], {} search with {} on {}",
            instance.id,
            bounds.lower,
            bounds.upper,
            mode,
            self.config.encoding,
            self.engine.name()
        );

        let mut state = SearchState::new(bounds, self.config.time_budget());
        let outcome = match mode {
            SearchMode::Optimize => self.optimize(&builder, bounds, &mut state),
            _ => self.scan(&builder, &mut state),
        };
        *attempts = state.attempts;
        outcome
    }

    /// Feasibility scan from the lower bound; the first feasible height is optimal.
    fn scan(&mut self, builder: &ModelBuilder<'_>, state: &mut SearchState) -> Result<Packing> {
        let instance = builder.instance();

        for height in state.lower_bound..=state.upper_bound {
            if state.is_out_of_time() {
                return Err(self.timeout(state));
            }
            state.current_height = height;
            state.attempts += 1;

            let model = builder.build_for_height(height);
            let (vars, constraints) = model.size();
            let started = Instant::now();
            let verdict = self.engine.solve(&model, state.time_remaining)?;
            state.charge(started.elapsed());

            debug!(
                "Instance '{}' height {}: {} ({} vars, {} constraints, {:.2}s left)",
                instance.id,
                height,
                verdict_label(&verdict),
                vars,
                constraints,
                state.time_remaining.as_secs_f64()
            );

            match verdict {
                Verdict::Feasible(assignment) => return decode(&model, instance, &assignment),
                Verdict::Infeasible => continue,
                Verdict::TimedOut => return Err(self.timeout(state)),
            }
        }

        Err(PackingError::Exhausted {
            upper_bound: state.upper_bound,
        })
    }

    /// One parametric model with the height minimised by the engine.
    fn optimize(
        &mut self,
        builder: &ModelBuilder<'_>,
        bounds: Bounds,
        state: &mut SearchState,
    ) -> Result<Packing> {
        if !self.engine.supports_minimize() {
            return Err(PackingError::UnsupportedMode(format!(
                "{} cannot minimise the plate height",
                self.engine.name()
            )));
        }

        let model = builder.build_parametric(bounds)?;
        let (vars, constraints) = model.size();
        state.current_height = bounds.upper;
        state.attempts += 1;

        let started = Instant::now();
        let verdict = self.engine.solve(&model, state.time_remaining)?;
        state.charge(started.elapsed());

        debug!(
            "Instance '{}' heights [{}, {}]: {} ({} vars, {} constraints, {:.2}s left)",
            builder.instance().id,
            bounds.lower,
            bounds.upper,
            verdict_label(&verdict),
            vars,
            constraints,
            state.time_remaining.as_secs_f64()
        );

        match verdict {
            Verdict::Feasible(assignment) => {
                let packing = decode(&model, builder.instance(), &assignment)?;
                state.current_height = packing.plate_height;
                Ok(packing)
            }
            Verdict::Infeasible => Err(PackingError::Exhausted {
                upper_bound: bounds.upper,
            }),
            Verdict::TimedOut => Err(self.timeout(state)),
        }
    }

    fn timeout(&self, state: &SearchState) -> PackingError {
        PackingError::SolverTimeout {
            elapsed: self
                .config
                .time_budget()
                .saturating_sub(state.time_remaining),
        }
    }
}

fn verdict_label(verdict: &Verdict) -> &'static str {
    match verdict {
        Verdict::Feasible(_) => "feasible",
        Verdict::Infeasible => "infeasible",
        Verdict::TimedOut => "timed out",
    }
}
