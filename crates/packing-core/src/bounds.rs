use crate::types::*;
use std::ops::RangeInclusive;

#[cfg(test)]
mod tests;

/// Provably valid bounds on the optimal plate height of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub lower: u32,
    pub upper: u32,
}

impl Bounds {
    /// Computes both bounds, rejecting malformed or unpackable instances first.
    ///
    /// The lower bound is the larger of the area bound `ceil(sum(w*h) / W)` and the
    /// tallest item in its flattest orientation that fits the width. The upper bound is
    /// the height of [`Bounds::stacked_packing`], which is a feasible packing.
    pub fn compute(instance: &Instance) -> Result<Self> {
        instance.validate()?;
        instance.check_fits()?;

        let area_bound = instance
            .total_area()
            .div_ceil(u64::from(instance.plate_width));

        let tallest = (0..instance.len())
            .map(|i| {
                instance
                    .orientations(i)
                    .map(|rotated| instance.rectangles[i].oriented(rotated).1)
                    .min()
                    .unwrap_or(instance.rectangles[i].height)
            })
            .max()
            .unwrap_or(0);

        let lower = to_height(area_bound.max(u64::from(tallest)), &instance.id)?;
        let upper = Self::stacked_packing(instance)?.plate_height;

        Ok(Self { lower, upper })
    }

    /// Candidate heights in scan order.
    pub fn heights(&self) -> RangeInclusive<u32> {
        self.lower..=self.upper
    }

    /// Stacks every item at `x = 0` in its first fitting orientation. The shortest item
    /// sits beside another item instead of on top when their widths fit side by side,
    /// which yields `sum(h) - min(h)`.
    pub fn stacked_packing(instance: &Instance) -> Result<Packing> {
        instance.check_fits()?;

        let oriented: Vec<(u32, u32, bool)> = (0..instance.len())
            .map(|i| {
                let rotated = instance.orientations(i).next().unwrap_or(false);
                let (w, h) = instance.rectangles[i].oriented(rotated);
                (w, h, rotated)
            })
            .collect();

        let shortest = oriented
            .iter()
            .enumerate()
            .min_by_key(|(_, (_, h, _))| *h)
            .map(|(i, _)| i);

        // Any partner works: it is at least as tall as the shortest item.
        let beside = shortest.and_then(|s| {
            oriented
                .iter()
                .enumerate()
                .find(|&(j, &(w, _, _))| {
                    let pair_width = u64::from(oriented[s].0) + u64::from(w);
                    j != s && pair_width <= u64::from(instance.plate_width)
                })
                .map(|(j, _)| (s, j))
        });

        let mut placements = vec![
            Placement {
                width: 0,
                height: 0,
                x: 0,
                y: 0,
                rotated: false,
            };
            instance.len()
        ];
        let mut top: u64 = 0;

        for (i, &(width, height, rotated)) in oriented.iter().enumerate() {
            if matches!(beside, Some((s, _)) if s == i) {
                continue;
            }
            placements[i] = Placement {
                width,
                height,
                x: 0,
                y: to_height(top, &instance.id)?,
                rotated,
            };
            top += u64::from(height);
        }

        if let Some((s, j)) = beside {
            let (width, height, rotated) = oriented[s];
            placements[s] = Placement {
                width,
                height,
                x: placements[j].width,
                y: placements[j].y,
                rotated,
            };
        }

        Ok(Packing {
            plate_width: instance.plate_width,
            plate_height: to_height(top, &instance.id)?,
            placements,
        })
    }
}

fn to_height(value: u64, instance_id: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        PackingError::InvalidInstance(format!(
            "Instance '{}' needs a plate height beyond {}",
            instance_id,
            u32::MAX
        ))
    })
}
