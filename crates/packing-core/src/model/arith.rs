use super::linear::{Constraint, HeightRef, LinExpr, LinearLayout, LinearModel, VarId};
use super::{EncodingStrategy, HeightSpec, ModelBuilder, Orientation};

/// Variables and expressions shared by the arithmetic families.
pub(super) struct ArithBase {
    pub model: LinearModel,
    pub x: Vec<VarId>,
    pub y: Vec<VarId>,
    /// Effective width and height of each item, linear in its 0/1 rotation variable.
    pub widths: Vec<LinExpr>,
    pub heights: Vec<LinExpr>,
    pub plate_height: LinExpr,
    pub orientations: Vec<Vec<Orientation>>,
}

impl ArithBase {
    /// Declares positions, rotation and plate height, then adds the domain and
    /// symmetry-breaking constraints.
    pub fn new(builder: &ModelBuilder<'_>, spec: HeightSpec, family: EncodingStrategy) -> Self {
        let instance = builder.instance();
        let n = instance.len();
        let plate_width = i64::from(instance.plate_width);
        let max_height = spec.max();
        let mut model = LinearModel::new(family);

        let height_var = match spec {
            HeightSpec::Fixed(_) => None,
            HeightSpec::Range(bounds) => Some(model.new_int(
                "plate_height",
                i64::from(bounds.lower),
                i64::from(bounds.upper),
            )),
        };
        let plate_height = match height_var {
            Some(var) => LinExpr::var(var),
            None => LinExpr::constant(i64::from(max_height)),
        };

        let x: Vec<VarId> = (0..n)
            .map(|i| model.new_int(format!("x_{i}"), 0, plate_width))
            .collect();
        let y: Vec<VarId> = (0..n)
            .map(|i| model.new_int(format!("y_{i}"), 0, i64::from(max_height)))
            .collect();
        let rotation: Option<Vec<VarId>> = instance.rotation.then(|| {
            (0..n)
                .map(|i| model.new_int(format!("r_{i}"), 0, 1))
                .collect()
        });

        let orientations: Vec<Vec<Orientation>> = (0..n)
            .map(|i| builder.orientations(i, max_height))
            .collect();

        let mut widths = Vec::with_capacity(n);
        let mut heights = Vec::with_capacity(n);
        for (i, options) in orientations.iter().enumerate() {
            let r = rotation.as_ref().map(|r| r[i]);
            let (width, height) = match (options.as_slice(), r) {
                ([_, _], Some(r)) => {
                    // w_eff = w + (h - w) r, h_eff = h + (w - h) r
                    let rect = instance.rectangles[i];
                    let (w, h) = (i64::from(rect.width), i64::from(rect.height));
                    (
                        LinExpr::term(h - w, r).offset(w),
                        LinExpr::term(w - h, r).offset(h),
                    )
                }
                ([first, ..], r) => {
                    if let Some(r) = r {
                        model.fix(r, i64::from(first.rotated));
                    }
                    (
                        LinExpr::constant(i64::from(first.width)),
                        LinExpr::constant(i64::from(first.height)),
                    )
                }
                ([], _) => {
                    // No orientation fits: 1 <= 0
                    model.add(Constraint::AtMost(LinExpr::constant(1)));
                    let rect = instance.rectangles[i];
                    (
                        LinExpr::constant(i64::from(rect.width)),
                        LinExpr::constant(i64::from(rect.height)),
                    )
                }
            };
            widths.push(width);
            heights.push(height);
        }

        let plate_width_expr = LinExpr::constant(plate_width);
        for i in 0..n {
            model.add_le(LinExpr::var(x[i]).add(&widths[i]), &plate_width_expr);
            model.add_le(LinExpr::var(y[i]).add(&heights[i]), &plate_height);
        }

        // Anchor the largest item in the lower half of both axes:
        // 2x + w_eff <= W and 2y + h_eff <= H.
        if let Some(a) = builder.anchor() {
            model.add_le(LinExpr::term(2, x[a]).add(&widths[a]), &plate_width_expr);
            model.add_le(LinExpr::term(2, y[a]).add(&heights[a]), &plate_height);
        }

        for &(i, j) in builder.identical_pairs() {
            model.add_le(LinExpr::var(x[i]), &LinExpr::var(x[j]));
        }

        if let Some(var) = height_var {
            model.minimize(var);
        }

        *model.layout_mut() = LinearLayout {
            x: x.clone(),
            y: y.clone(),
            rotation,
            height: match height_var {
                Some(var) => HeightRef::Var(var),
                None => HeightRef::Fixed(max_height),
            },
        };

        Self {
            model,
            x,
            y,
            widths,
            heights,
            plate_height,
            orientations,
        }
    }

    /// `x_i + w_i - x_j`: non-positive iff item `i` is left of item `j`.
    pub fn left_gap(&self, i: usize, j: usize) -> LinExpr {
        LinExpr::var(self.x[i])
            .add(&self.widths[i])
            .plus(-1, self.x[j])
    }

    /// `y_i + h_i - y_j`: non-positive iff item `i` is below item `j`.
    pub fn below_gap(&self, i: usize, j: usize) -> LinExpr {
        LinExpr::var(self.y[i])
            .add(&self.heights[i])
            .plus(-1, self.y[j])
    }

    /// `w_i + w_j - W` when some orientation pair is too wide to sit side by side.
    pub fn width_excess(&self, i: usize, j: usize, plate_width: u32) -> Option<LinExpr> {
        self.exceeds(i, j, |o| o.width, u64::from(plate_width))
            .then(|| {
                self.widths[i]
                    .clone()
                    .add(&self.widths[j])
                    .offset(-i64::from(plate_width))
            })
    }

    /// `h_i + h_j - H` when some orientation pair is too tall to stack within `max_height`.
    pub fn height_excess(&self, i: usize, j: usize, max_height: u32) -> Option<LinExpr> {
        self.exceeds(i, j, |o| o.height, u64::from(max_height))
            .then(|| {
                self.heights[i]
                    .clone()
                    .add(&self.heights[j])
                    .sub(&self.plate_height)
            })
    }

    fn exceeds(&self, i: usize, j: usize, extent: impl Fn(&Orientation) -> u32, limit: u64) -> bool {
        self.orientations[i].iter().any(|oi| {
            self.orientations[j]
                .iter()
                .any(|oj| u64::from(extent(oi)) + u64::from(extent(oj)) > limit)
        })
    }
}
