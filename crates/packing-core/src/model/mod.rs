//! Constraint models for placing an instance on a plate.
//!
//! Three encoding families share one builder:
//!
//! - [`EncodingStrategy::OrderSat`]: order-encoded boolean ladders, emitted as CNF
//! - [`EncodingStrategy::BigM`]: 0/1 indicators relaxed by big-M constants (MIP style)
//! - [`EncodingStrategy::Cumulative`]: half-reified disjunctions plus cumulative profiles
//!
//! Every family emits domain, rotation, pairwise non-overlap and symmetry-breaking
//! constraints. The families differ only in the primitives they use.

use crate::bounds::Bounds;
use crate::types::*;
use serde::{Deserialize, Serialize};

mod arith;
mod big_m;
mod cnf;
mod cumulative;
mod linear;
mod order;

pub use cnf::{CnfLayout, CnfModel};
pub use linear::{
    BoolLit, Constraint, Cumulative, CumulativeTask, HeightRef, LinExpr, LinearLayout,
    LinearModel, VarDecl, VarId, VarKind,
};

/// Encoding family, fixed when a [`ModelBuilder`] is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncodingStrategy {
    #[default]
    OrderSat,
    BigM,
    Cumulative,
}

impl EncodingStrategy {
    /// Whether the family can leave the plate height as a decision variable.
    pub fn supports_parametric_height(&self) -> bool {
        !matches!(self, Self::OrderSat)
    }
}

impl std::fmt::Display for EncodingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OrderSat => write!(f, "order-sat"),
            Self::BigM => write!(f, "big-m"),
            Self::Cumulative => write!(f, "cumulative"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelOptions {
    /// Anchor the largest item and order identical items.
    #[serde(default = "default_true")]
    pub symmetry_breaking: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            symmetry_breaking: true,
        }
    }
}

/// A model ready to be handed to a solving engine.
#[derive(Debug, Clone)]
pub enum Model {
    Cnf(CnfModel),
    Linear(LinearModel),
}

impl Model {
    pub fn family(&self) -> EncodingStrategy {
        match self {
            Self::Cnf(_) => EncodingStrategy::OrderSat,
            Self::Linear(model) => model.family(),
        }
    }

    /// Number of declared variables and emitted constraints.
    pub fn size(&self) -> (usize, usize) {
        match self {
            Self::Cnf(model) => (model.num_vars() as usize, model.clauses().len()),
            Self::Linear(model) => (model.vars().len(), model.constraints().len()),
        }
    }

    /// Whether the engine is asked to minimise the plate height.
    pub fn is_parametric(&self) -> bool {
        matches!(self, Self::Linear(model) if model.objective().is_some())
    }
}

/// One allowed orientation of an item, with its effective dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Orientation {
    pub rotated: bool,
    pub width: u32,
    pub height: u32,
}

/// Emits the constraint model of one instance for a candidate height or a height range.
#[derive(Debug, Clone)]
pub struct ModelBuilder<'a> {
    instance: &'a Instance,
    strategy: EncodingStrategy,
    options: ModelOptions,
    anchor: Option<usize>,
    identical_pairs: Vec<(usize, usize)>,
}

impl<'a> ModelBuilder<'a> {
    /// Validates the instance and fails fast when an item cannot fit the plate.
    pub fn new(
        instance: &'a Instance,
        strategy: EncodingStrategy,
        options: ModelOptions,
    ) -> Result<Self> {
        instance.validate()?;
        instance.check_fits()?;

        let (anchor, identical_pairs) = if options.symmetry_breaking {
            (largest_item(instance), identical_pairs(instance))
        } else {
            (None, Vec::new())
        };

        Ok(Self {
            instance,
            strategy,
            options,
            anchor,
            identical_pairs,
        })
    }

    pub fn strategy(&self) -> EncodingStrategy {
        self.strategy
    }

    pub fn options(&self) -> ModelOptions {
        self.options
    }

    pub fn instance(&self) -> &Instance {
        self.instance
    }

    /// Feasibility model for a fixed plate height.
    pub fn build_for_height(&self, height: u32) -> Model {
        match self.strategy {
            EncodingStrategy::OrderSat => Model::Cnf(order::build(self, height)),
            EncodingStrategy::BigM => {
                Model::Linear(big_m::build(self, HeightSpec::Fixed(height)))
            }
            EncodingStrategy::Cumulative => {
                Model::Linear(cumulative::build(self, HeightSpec::Fixed(height)))
            }
        }
    }

    /// Optimisation model with the plate height as a variable in `bounds`, to be minimised.
    pub fn build_parametric(&self, bounds: Bounds) -> Result<Model> {
        let spec = HeightSpec::Range(bounds);
        match self.strategy {
            EncodingStrategy::OrderSat => Err(PackingError::UnsupportedMode(format!(
                "{} models need a fixed plate height",
                self.strategy
            ))),
            EncodingStrategy::BigM => Ok(Model::Linear(big_m::build(self, spec))),
            EncodingStrategy::Cumulative => Ok(Model::Linear(cumulative::build(self, spec))),
        }
    }

    /// Orientations of item `index` whose effective dimensions fit `W x max_height`.
    pub(crate) fn orientations(&self, index: usize, max_height: u32) -> Vec<Orientation> {
        let rect = self.instance.rectangles[index];
        self.instance
            .orientations(index)
            .map(|rotated| {
                let (width, height) = rect.oriented(rotated);
                Orientation {
                    rotated,
                    width,
                    height,
                }
            })
            .filter(|o| o.height <= max_height)
            .collect()
    }

    pub(crate) fn anchor(&self) -> Option<usize> {
        self.anchor
    }

    pub(crate) fn identical_pairs(&self) -> &[(usize, usize)] {
        &self.identical_pairs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HeightSpec {
    Fixed(u32),
    Range(Bounds),
}

impl HeightSpec {
    /// Largest height the model may use.
    pub(crate) fn max(&self) -> u32 {
        match self {
            Self::Fixed(height) => *height,
            Self::Range(bounds) => bounds.upper,
        }
    }
}

/// First index of maximal area. Identical copies of it come later, so it is also the
/// lowest index among them.
fn largest_item(instance: &Instance) -> Option<usize> {
    let mut best: Option<(usize, u64)> = None;
    for (index, rect) in instance.rectangles.iter().enumerate() {
        match best {
            Some((_, area)) if rect.area() <= area => {}
            _ => best = Some((index, rect.area())),
        }
    }
    best.map(|(index, _)| index)
}

fn identical_pairs(instance: &Instance) -> Vec<(usize, usize)> {
    let rects = &instance.rectangles;
    let mut pairs = Vec::new();
    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            if rects[i] == rects[j] {
                pairs.push((i, j));
            }
        }
    }
    pairs
}
