use super::cnf::{CnfBuilder, CnfLayout, CnfModel};
use super::{ModelBuilder, Orientation};

/// An orientation together with the literal that switches its clauses off when true.
#[derive(Debug, Clone, Copy)]
struct Guarded {
    orientation: Orientation,
    guard: Option<i32>,
}

/// Order encoding of the placement problem at a fixed plate height.
///
/// `px[i][e]` holds iff `x_i <= e`, so each ladder is monotone (`px[i][e] => px[i][e+1]`)
/// and the domain is enforced by forcing the top of the ladder. Non-overlap uses the
/// directional literals `lr[i][j]` (i left of j) and `ud[i][j]` (i below j) with the
/// usual 3-literal clauses. Clauses that depend on an item's orientation carry its
/// rotation literal as a guard.
pub(super) fn build(builder: &ModelBuilder<'_>, height: u32) -> CnfModel {
    let instance = builder.instance();
    let n = instance.len();
    let width = instance.plate_width;
    let mut cnf = CnfBuilder::default();

    let px: Vec<Vec<i32>> = (0..n).map(|_| cnf.new_vars(width)).collect();
    let py: Vec<Vec<i32>> = (0..n).map(|_| cnf.new_vars(height)).collect();
    let rotation = instance.rotation.then(|| cnf.new_vars(n as u32));
    let lr = directional(&mut cnf, n);
    let ud = directional(&mut cnf, n);

    let orientations: Vec<Vec<Guarded>> = (0..n)
        .map(|i| guarded_orientations(&mut cnf, builder, rotation.as_deref(), i, height))
        .collect();

    for i in 0..n {
        ladder(&mut cnf, &px[i]);
        ladder(&mut cnf, &py[i]);

        for g in &orientations[i] {
            for e in (width - g.orientation.width)..width {
                cnf.add_unless(&[g.guard], vec![px[i][e as usize]]);
            }
            for f in (height - g.orientation.height)..height {
                cnf.add_unless(&[g.guard], vec![py[i][f as usize]]);
            }
        }
    }

    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }

            for g in &orientations[i] {
                let wi = g.orientation.width;
                let hi = g.orientation.height;

                // lr(i, j) => x_j >= w_i
                cnf.add_unless(&[g.guard], vec![-lr[i][j], -px[j][(wi - 1) as usize]]);
                for e in 0..(width - wi) {
                    cnf.add_unless(
                        &[g.guard],
                        vec![-lr[i][j], px[i][e as usize], -px[j][(e + wi) as usize]],
                    );
                }

                // ud(i, j) => y_j >= h_i
                cnf.add_unless(&[g.guard], vec![-ud[i][j], -py[j][(hi - 1) as usize]]);
                for f in 0..(height - hi) {
                    cnf.add_unless(
                        &[g.guard],
                        vec![-ud[i][j], py[i][f as usize], -py[j][(f + hi) as usize]],
                    );
                }
            }

            // Items too wide (tall) to sit side by side cannot be left of (below) each other.
            for gi in &orientations[i] {
                for gj in &orientations[j] {
                    let (oi, oj) = (gi.orientation, gj.orientation);
                    if u64::from(oi.width) + u64::from(oj.width) > u64::from(width) {
                        cnf.add_unless(&[gi.guard, gj.guard], vec![-lr[i][j]]);
                    }
                    if u64::from(oi.height) + u64::from(oj.height) > u64::from(height) {
                        cnf.add_unless(&[gi.guard, gj.guard], vec![-ud[i][j]]);
                    }
                }
            }
        }
    }

    for i in 0..n {
        for j in (i + 1)..n {
            cnf.add(vec![lr[i][j], lr[j][i], ud[i][j], ud[j][i]]);
        }
    }

    if let Some(anchor) = builder.anchor() {
        for g in &orientations[anchor] {
            let max_x = (width - g.orientation.width) / 2;
            let max_y = (height - g.orientation.height) / 2;
            cnf.add_unless(&[g.guard], vec![px[anchor][max_x as usize]]);
            cnf.add_unless(&[g.guard], vec![py[anchor][max_y as usize]]);

            for k in (0..n).filter(|&k| k != anchor) {
                for gk in &orientations[k] {
                    if gk.orientation.width > max_x {
                        cnf.add_unless(&[g.guard, gk.guard], vec![-lr[k][anchor]]);
                    }
                    if gk.orientation.height > max_y {
                        cnf.add_unless(&[g.guard, gk.guard], vec![-ud[k][anchor]]);
                    }
                }
            }
        }
    }

    // Identical items: the lower index is never strictly right of the other.
    for &(i, j) in builder.identical_pairs() {
        for e in 0..width as usize {
            cnf.add(vec![-px[j][e], px[i][e]]);
        }
        cnf.add(vec![-lr[j][i]]);
    }

    cnf.finish(CnfLayout {
        px,
        py,
        rotation,
        plate_height: height,
    })
}

/// `n x n` matrix of fresh literals; the diagonal stays 0 and is never used.
fn directional(cnf: &mut CnfBuilder, n: usize) -> Vec<Vec<i32>> {
    (0..n)
        .map(|i| {
            (0..n)
                .map(|j| if i == j { 0 } else { cnf.new_var() })
                .collect()
        })
        .collect()
}

fn ladder(cnf: &mut CnfBuilder, steps: &[i32]) {
    for pair in steps.windows(2) {
        cnf.add(vec![-pair[0], pair[1]]);
    }
}

/// Orientations of item `index` that fit the plate at `height`, each guarded by the
/// rotation literal when both remain possible. A single remaining orientation is forced
/// with a unit clause; none at all refutes the model.
fn guarded_orientations(
    cnf: &mut CnfBuilder,
    builder: &ModelBuilder<'_>,
    rotation: Option<&[i32]>,
    index: usize,
    height: u32,
) -> Vec<Guarded> {
    let options = builder.orientations(index, height);
    if options.is_empty() {
        cnf.refute();
        return Vec::new();
    }

    let Some(r) = rotation.map(|r| r[index]) else {
        return options
            .into_iter()
            .map(|orientation| Guarded {
                orientation,
                guard: None,
            })
            .collect();
    };

    if let [only] = options.as_slice() {
        cnf.add(vec![if only.rotated { r } else { -r }]);
        return vec![Guarded {
            orientation: *only,
            guard: None,
        }];
    }

    options
        .into_iter()
        .map(|orientation| Guarded {
            guard: Some(if orientation.rotated { -r } else { r }),
            orientation,
        })
        .collect()
}
