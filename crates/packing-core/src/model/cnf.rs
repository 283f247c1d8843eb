/// Clause set over DIMACS-style literals (`v` or `-v`, variables from 1).
#[derive(Debug, Clone)]
pub struct CnfModel {
    num_vars: u32,
    clauses: Vec<Vec<i32>>,
    /// Set when construction already refuted the model, e.g. an item taller than the plate.
    contradiction: bool,
    layout: CnfLayout,
}

/// Order-encoding ladders: `px[i][e]` holds iff `x_i <= e`, `py[i][f]` iff `y_i <= f`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CnfLayout {
    pub px: Vec<Vec<i32>>,
    pub py: Vec<Vec<i32>>,
    pub rotation: Option<Vec<i32>>,
    pub plate_height: u32,
}

impl CnfModel {
    pub fn num_vars(&self) -> u32 {
        self.num_vars
    }

    pub fn clauses(&self) -> &[Vec<i32>] {
        &self.clauses
    }

    pub fn is_contradiction(&self) -> bool {
        self.contradiction
    }

    pub fn layout(&self) -> &CnfLayout {
        &self.layout
    }

    /// Evaluates the clause set under a total assignment indexed by `var - 1`.
    pub fn is_satisfied_by(&self, values: &[bool]) -> bool {
        !self.contradiction
            && self.clauses.iter().all(|clause| {
                clause.iter().any(|&lit| {
                    let value = values
                        .get(lit.unsigned_abs() as usize - 1)
                        .copied()
                        .unwrap_or(false);
                    value == (lit > 0)
                })
            })
    }
}

/// Incremental construction of a [`CnfModel`].
#[derive(Debug, Default)]
pub(crate) struct CnfBuilder {
    num_vars: u32,
    clauses: Vec<Vec<i32>>,
    contradiction: bool,
}

impl CnfBuilder {
    pub(crate) fn new_var(&mut self) -> i32 {
        self.num_vars += 1;
        self.num_vars as i32
    }

    pub(crate) fn new_vars(&mut self, count: u32) -> Vec<i32> {
        (0..count).map(|_| self.new_var()).collect()
    }

    pub(crate) fn add(&mut self, clause: Vec<i32>) {
        if clause.is_empty() {
            self.contradiction = true;
        } else {
            self.clauses.push(clause);
        }
    }

    /// Adds `clause` so that it only binds when no guard literal is true.
    pub(crate) fn add_unless(&mut self, guards: &[Option<i32>], mut clause: Vec<i32>) {
        clause.extend(guards.iter().flatten().copied());
        self.add(clause);
    }

    pub(crate) fn refute(&mut self) {
        self.contradiction = true;
    }

    pub(crate) fn finish(self, layout: CnfLayout) -> CnfModel {
        CnfModel {
            num_vars: self.num_vars,
            clauses: self.clauses,
            contradiction: self.contradiction,
            layout,
        }
    }
}
