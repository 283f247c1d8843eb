use super::arith::ArithBase;
use super::linear::{
    BoolLit, Constraint, Cumulative, CumulativeTask, LinExpr, LinearModel, VarId,
};
use super::{EncodingStrategy, HeightSpec, ModelBuilder};

/// Constraint-programming model: boolean relative-position indicators imply their
/// disjunct (half-reification), and two cumulative profiles bound the load of every
/// row and every column.
pub(super) fn build(builder: &ModelBuilder<'_>, spec: HeightSpec) -> LinearModel {
    let instance = builder.instance();
    let n = instance.len();
    let plate_width = instance.plate_width;
    let max_height = spec.max();

    let mut base = ArithBase::new(builder, spec, EncodingStrategy::Cumulative);

    for i in 0..n {
        for j in (i + 1)..n {
            let left_ij = base.model.new_bool(format!("left_{i}_{j}"));
            let left_ji = base.model.new_bool(format!("left_{j}_{i}"));
            let below_ij = base.model.new_bool(format!("below_{i}_{j}"));
            let below_ji = base.model.new_bool(format!("below_{j}_{i}"));

            base.model.add(Constraint::Clause(
                [left_ij, left_ji, below_ij, below_ji]
                    .into_iter()
                    .map(BoolLit::pos)
                    .collect(),
            ));

            let implications: [(VarId, LinExpr); 4] = [
                (left_ij, base.left_gap(i, j)),
                (left_ji, base.left_gap(j, i)),
                (below_ij, base.below_gap(i, j)),
                (below_ji, base.below_gap(j, i)),
            ];
            for (lit, gap) in implications {
                base.model.add(Constraint::Implies(BoolLit::pos(lit), gap));
            }

            if let Some(excess) = base.width_excess(i, j, plate_width) {
                for lit in [left_ij, left_ji] {
                    base.model
                        .add(Constraint::Implies(BoolLit::pos(lit), excess.clone()));
                }
            }
            if let Some(excess) = base.height_excess(i, j, max_height) {
                for lit in [below_ij, below_ji] {
                    base.model
                        .add(Constraint::Implies(BoolLit::pos(lit), excess.clone()));
                }
            }

            if builder.identical_pairs().contains(&(i, j)) {
                base.model.add(Constraint::Clause(vec![BoolLit::neg(left_ji)]));
            }
        }
    }

    // Rows: items covering a row sit side by side, so their widths fit W.
    let rows = Cumulative {
        tasks: (0..n)
            .map(|i| CumulativeTask {
                start: base.y[i],
                length: base.heights[i].clone(),
                demand: base.widths[i].clone(),
            })
            .collect(),
        capacity: LinExpr::constant(i64::from(plate_width)),
        horizon: i64::from(max_height),
    };
    // Columns: items covering a column are stacked, so their heights fit the plate.
    let columns = Cumulative {
        tasks: (0..n)
            .map(|i| CumulativeTask {
                start: base.x[i],
                length: base.widths[i].clone(),
                demand: base.heights[i].clone(),
            })
            .collect(),
        capacity: base.plate_height.clone(),
        horizon: i64::from(plate_width),
    };
    base.model.add(Constraint::Cumulative(rows));
    base.model.add(Constraint::Cumulative(columns));

    base.model
}
