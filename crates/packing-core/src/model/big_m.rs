use super::arith::ArithBase;
use super::linear::{Constraint, LinExpr, LinearModel, VarId};
use super::{EncodingStrategy, HeightSpec, ModelBuilder};

/// Indicator positions of a pair `(i, j)`, `i < j`.
const I_LEFT_OF_J: usize = 0;
const J_LEFT_OF_I: usize = 1;
const I_BELOW_J: usize = 2;
const J_BELOW_I: usize = 3;

/// MIP-style model: each pair picks one of four relative positions through 0/1
/// indicators, and the unchosen disjuncts are relaxed by `M_x = W` or `M_y = H`
/// (the upper bound in optimisation mode).
pub(super) fn build(builder: &ModelBuilder<'_>, spec: HeightSpec) -> LinearModel {
    let instance = builder.instance();
    let n = instance.len();
    let plate_width = instance.plate_width;
    let max_height = spec.max();
    let big_x = i64::from(plate_width);
    let big_y = i64::from(max_height);

    let mut base = ArithBase::new(builder, spec, EncodingStrategy::BigM);

    for i in 0..n {
        for j in (i + 1)..n {
            let d: Vec<VarId> = (0..4)
                .map(|k| base.model.new_int(format!("d_{i}_{j}_{k}"), 0, 1))
                .collect();

            // sum(d) >= 1
            let chosen = d
                .iter()
                .fold(LinExpr::constant(1), |expr, &var| expr.plus(-1, var));
            base.model.add(Constraint::AtMost(chosen));

            let disjuncts = [
                (I_LEFT_OF_J, base.left_gap(i, j), big_x),
                (J_LEFT_OF_I, base.left_gap(j, i), big_x),
                (I_BELOW_J, base.below_gap(i, j), big_y),
                (J_BELOW_I, base.below_gap(j, i), big_y),
            ];
            for (k, gap, big) in disjuncts {
                relax(&mut base.model, gap, d[k], big);
            }

            if let Some(excess) = base.width_excess(i, j, plate_width) {
                relax(&mut base.model, excess.clone(), d[I_LEFT_OF_J], big_x);
                relax(&mut base.model, excess, d[J_LEFT_OF_I], big_x);
            }
            if let Some(excess) = base.height_excess(i, j, max_height) {
                relax(&mut base.model, excess.clone(), d[I_BELOW_J], big_y);
                relax(&mut base.model, excess, d[J_BELOW_I], big_y);
            }

            if builder.identical_pairs().contains(&(i, j)) {
                base.model.fix(d[J_LEFT_OF_I], 0);
            }
        }
    }

    base.model
}

/// `expr <= M (1 - d)`, i.e. `expr + M d - M <= 0`.
fn relax(model: &mut LinearModel, expr: LinExpr, indicator: VarId, big: i64) {
    model.add(Constraint::AtMost(expr.plus(big, indicator).offset(-big)));
}
