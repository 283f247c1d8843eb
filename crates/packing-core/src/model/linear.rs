use super::EncodingStrategy;
use crate::engine::Assignment;
use crate::types::*;
use std::fmt::Write;

pub type VarId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Int { lower: i64, upper: i64 },
    Bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDecl {
    pub name: String,
    pub kind: VarKind,
}

/// `sum(coef * var) + constant`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinExpr {
    pub terms: Vec<(i64, VarId)>,
    pub constant: i64,
}

impl LinExpr {
    pub fn constant(value: i64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    pub fn var(var: VarId) -> Self {
        Self::term(1, var)
    }

    pub fn term(coef: i64, var: VarId) -> Self {
        Self {
            terms: vec![(coef, var)],
            constant: 0,
        }
    }

    pub fn plus(mut self, coef: i64, var: VarId) -> Self {
        if coef != 0 {
            self.terms.push((coef, var));
        }
        self
    }

    pub fn offset(mut self, value: i64) -> Self {
        self.constant += value;
        self
    }

    pub fn add(mut self, other: &LinExpr) -> Self {
        self.terms.extend(other.terms.iter().copied());
        self.constant += other.constant;
        self
    }

    pub fn sub(self, other: &LinExpr) -> Self {
        self.add(&other.scaled(-1))
    }

    pub fn scaled(&self, factor: i64) -> Self {
        Self {
            terms: self.terms.iter().map(|&(c, v)| (c * factor, v)).collect(),
            constant: self.constant * factor,
        }
    }

    pub fn eval(&self, values: &[i64]) -> i64 {
        self.terms
            .iter()
            .map(|&(coef, var)| coef * values[var])
            .sum::<i64>()
            + self.constant
    }

    /// Constant value when the expression has no variable terms.
    pub fn as_constant(&self) -> Option<i64> {
        self.terms.is_empty().then_some(self.constant)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoolLit {
    pub var: VarId,
    pub positive: bool,
}

impl BoolLit {
    pub fn pos(var: VarId) -> Self {
        Self {
            var,
            positive: true,
        }
    }

    pub fn neg(var: VarId) -> Self {
        Self {
            var,
            positive: false,
        }
    }

    fn holds(&self, values: &[i64]) -> bool {
        (values[self.var] != 0) == self.positive
    }
}

/// One item of a cumulative constraint along an axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CumulativeTask {
    pub start: VarId,
    pub length: LinExpr,
    pub demand: LinExpr,
}

/// At every slice `u` in `0..horizon`, the demands of tasks covering `u` sum to at most
/// `capacity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cumulative {
    pub tasks: Vec<CumulativeTask>,
    pub capacity: LinExpr,
    pub horizon: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// `expr <= 0`
    AtMost(LinExpr),
    /// At least one literal holds.
    Clause(Vec<BoolLit>),
    /// `lit => expr <= 0`
    Implies(BoolLit, LinExpr),
    Cumulative(Cumulative),
}

impl Constraint {
    fn holds(&self, values: &[i64]) -> bool {
        match self {
            Self::AtMost(expr) => expr.eval(values) <= 0,
            Self::Clause(lits) => lits.iter().any(|l| l.holds(values)),
            Self::Implies(lit, expr) => !lit.holds(values) || expr.eval(values) <= 0,
            Self::Cumulative(cumulative) => {
                let capacity = cumulative.capacity.eval(values);
                (0..cumulative.horizon).all(|u| {
                    let load: i64 = cumulative
                        .tasks
                        .iter()
                        .filter(|task| {
                            let start = values[task.start];
                            start <= u && u < start + task.length.eval(values)
                        })
                        .map(|task| task.demand.eval(values))
                        .sum();
                    load <= capacity
                })
            }
        }
    }
}

/// Plate height of a model: fixed in feasibility mode, a variable in optimisation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeightRef {
    Fixed(u32),
    Var(VarId),
}

/// Variables carrying the placement of each item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearLayout {
    pub x: Vec<VarId>,
    pub y: Vec<VarId>,
    pub rotation: Option<Vec<VarId>>,
    pub height: HeightRef,
}

/// Integer/boolean model with linear, clausal, half-reified and cumulative constraints.
#[derive(Debug, Clone)]
pub struct LinearModel {
    family: EncodingStrategy,
    vars: Vec<VarDecl>,
    constraints: Vec<Constraint>,
    objective: Option<VarId>,
    layout: LinearLayout,
}

impl LinearModel {
    pub(crate) fn new(family: EncodingStrategy) -> Self {
        Self {
            family,
            vars: Vec::new(),
            constraints: Vec::new(),
            objective: None,
            layout: LinearLayout {
                x: Vec::new(),
                y: Vec::new(),
                rotation: None,
                height: HeightRef::Fixed(0),
            },
        }
    }

    pub(crate) fn new_int(&mut self, name: impl Into<String>, lower: i64, upper: i64) -> VarId {
        self.vars.push(VarDecl {
            name: name.into(),
            kind: VarKind::Int { lower, upper },
        });
        self.vars.len() - 1
    }

    pub(crate) fn new_bool(&mut self, name: impl Into<String>) -> VarId {
        self.vars.push(VarDecl {
            name: name.into(),
            kind: VarKind::Bool,
        });
        self.vars.len() - 1
    }

    /// Narrows the domain of an integer variable.
    pub(crate) fn fix(&mut self, var: VarId, value: i64) {
        self.vars[var].kind = VarKind::Int {
            lower: value,
            upper: value,
        };
    }

    pub(crate) fn add(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Adds `lhs <= rhs`.
    pub(crate) fn add_le(&mut self, lhs: LinExpr, rhs: &LinExpr) {
        self.constraints.push(Constraint::AtMost(lhs.sub(rhs)));
    }

    pub(crate) fn minimize(&mut self, var: VarId) {
        self.objective = Some(var);
    }

    pub(crate) fn layout_mut(&mut self) -> &mut LinearLayout {
        &mut self.layout
    }

    pub fn family(&self) -> EncodingStrategy {
        self.family
    }

    pub fn vars(&self) -> &[VarDecl] {
        &self.vars
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> Option<VarId> {
        self.objective
    }

    pub fn layout(&self) -> &LinearLayout {
        &self.layout
    }

    pub fn var_name(&self, var: VarId) -> &str {
        &self.vars[var].name
    }

    pub fn var_by_name(&self, name: &str) -> Option<VarId> {
        self.vars.iter().position(|decl| decl.name == name)
    }

    /// Orders the named values of an assignment by variable id.
    pub fn values_from(&self, assignment: &Assignment) -> Result<Vec<i64>> {
        self.vars
            .iter()
            .map(|decl| {
                assignment.value(&decl.name).ok_or_else(|| {
                    PackingError::DecodeInvariantViolation(format!(
                        "Assignment has no value for '{}'",
                        decl.name
                    ))
                })
            })
            .collect()
    }

    /// Index of the first violated domain or constraint, `None` when `values` satisfies
    /// the model. Domain violations are reported as `usize::MAX`.
    pub fn first_violation(&self, values: &[i64]) -> Option<usize> {
        let in_domain = self.vars.iter().zip(values).all(|(decl, &v)| match decl.kind {
            VarKind::Int { lower, upper } => lower <= v && v <= upper,
            VarKind::Bool => v == 0 || v == 1,
        });
        if !in_domain || values.len() != self.vars.len() {
            return Some(usize::MAX);
        }

        self.constraints.iter().position(|c| !c.holds(values))
    }

    /// Renders the model as an SMT-LIB 2 script over `QF_LIA`.
    pub fn to_smtlib(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_smtlib(&mut out);
        out
    }

    fn write_smtlib(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "(set-option :produce-models true)")?;
        writeln!(out, "(set-logic QF_LIA)")?;

        for decl in &self.vars {
            match decl.kind {
                VarKind::Int { lower, upper } => {
                    writeln!(out, "(declare-const {} Int)", decl.name)?;
                    writeln!(
                        out,
                        "(assert (and (<= {} {}) (<= {} {})))",
                        smt_int(lower),
                        decl.name,
                        decl.name,
                        smt_int(upper)
                    )?;
                }
                VarKind::Bool => writeln!(out, "(declare-const {} Bool)", decl.name)?,
            }
        }

        for constraint in &self.constraints {
            match constraint {
                Constraint::AtMost(expr) => {
                    writeln!(out, "(assert {})", self.smt_at_most(expr))?;
                }
                Constraint::Clause(lits) => {
                    let lits: Vec<String> = lits.iter().map(|l| self.smt_lit(*l)).collect();
                    if lits.len() == 1 {
                        writeln!(out, "(assert {})", lits[0])?;
                    } else {
                        writeln!(out, "(assert (or {}))", lits.join(" "))?;
                    }
                }
                Constraint::Implies(lit, expr) => {
                    writeln!(
                        out,
                        "(assert (=> {} {}))",
                        self.smt_lit(*lit),
                        self.smt_at_most(expr)
                    )?;
                }
                Constraint::Cumulative(cumulative) => {
                    let capacity = self.smt_expr(&cumulative.capacity);
                    for u in 0..cumulative.horizon {
                        let loads: Vec<String> = cumulative
                            .tasks
                            .iter()
                            .map(|task| {
                                let start = self.var_name(task.start);
                                format!(
                                    "(ite (and (<= {start} {u}) (< {u} (+ {start} {}))) {} 0)",
                                    self.smt_expr(&task.length),
                                    self.smt_expr(&task.demand)
                                )
                            })
                            .collect();
                        writeln!(out, "(assert (<= (+ 0 {}) {}))", loads.join(" "), capacity)?;
                    }
                }
            }
        }

        if let Some(objective) = self.objective {
            writeln!(out, "(minimize {})", self.var_name(objective))?;
        }

        writeln!(out, "(check-sat)")?;
        let names: Vec<&str> = self.vars.iter().map(|d| d.name.as_str()).collect();
        writeln!(out, "(get-value ({}))", names.join(" "))?;
        writeln!(out, "(exit)")
    }

    fn smt_at_most(&self, expr: &LinExpr) -> String {
        // expr <= 0 is rendered as sum(terms) <= -constant
        let terms = LinExpr {
            terms: expr.terms.clone(),
            constant: 0,
        };
        format!(
            "(<= {} {})",
            self.smt_expr(&terms),
            smt_int(-expr.constant)
        )
    }

    fn smt_expr(&self, expr: &LinExpr) -> String {
        let mut parts: Vec<String> = expr
            .terms
            .iter()
            .map(|&(coef, var)| match coef {
                1 => self.var_name(var).to_string(),
                _ => format!("(* {} {})", smt_int(coef), self.var_name(var)),
            })
            .collect();
        if expr.constant != 0 || parts.is_empty() {
            parts.push(smt_int(expr.constant));
        }

        if parts.len() == 1 {
            parts.remove(0)
        } else {
            format!("(+ {})", parts.join(" "))
        }
    }

    fn smt_lit(&self, lit: BoolLit) -> String {
        let name = self.var_name(lit.var);
        match (self.vars[lit.var].kind, lit.positive) {
            (VarKind::Bool, true) => name.to_string(),
            (VarKind::Bool, false) => format!("(not {name})"),
            (VarKind::Int { .. }, true) => format!("(= {name} 1)"),
            (VarKind::Int { .. }, false) => format!("(= {name} 0)"),
        }
    }
}

fn smt_int(value: i64) -> String {
    if value < 0 {
        format!("(- {})", value.unsigned_abs())
    } else {
        value.to_string()
    }
}
