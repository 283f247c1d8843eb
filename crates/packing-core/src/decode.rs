use crate::engine::Assignment;
use crate::model::{CnfModel, HeightRef, LinearModel, Model};
use crate::types::*;

#[cfg(test)]
mod tests;

/// Reads the placement of every item out of an engine assignment and checks the result.
pub fn decode(model: &Model, instance: &Instance, assignment: &Assignment) -> Result<Packing> {
    let packing = match model {
        Model::Cnf(cnf) => decode_cnf(cnf, instance, assignment)?,
        Model::Linear(linear) => decode_linear(linear, instance, assignment)?,
    };
    verify_packing(instance, &packing)?;
    Ok(packing)
}

fn decode_cnf(model: &CnfModel, instance: &Instance, assignment: &Assignment) -> Result<Packing> {
    let layout = model.layout();
    // Least rung of the ladder that holds.
    let least_true = |ladder: &[i32], axis: &str, index: usize| -> Result<u32> {
        ladder
            .iter()
            .position(|&var| assignment.literal(var) == Some(true))
            .map(|e| e as u32)
            .ok_or_else(|| violation(format!("no {axis} coordinate set for item {index}")))
    };

    let placements = instance
        .rectangles
        .iter()
        .enumerate()
        .map(|(i, rect)| {
            let rotated = layout
                .rotation
                .as_ref()
                .is_some_and(|r| assignment.literal(r[i]) == Some(true));
            let (width, height) = rect.oriented(rotated);
            Ok(Placement {
                width,
                height,
                x: least_true(&layout.px[i], "x", i)?,
                y: least_true(&layout.py[i], "y", i)?,
                rotated,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Packing {
        plate_width: instance.plate_width,
        plate_height: layout.plate_height,
        placements,
    })
}

fn decode_linear(
    model: &LinearModel,
    instance: &Instance,
    assignment: &Assignment,
) -> Result<Packing> {
    let values = model.values_from(assignment)?;
    let layout = model.layout();
    let read = |var: usize| -> Result<u32> {
        u32::try_from(values[var]).map_err(|_| {
            violation(format!(
                "{} = {} is not a plate coordinate",
                model.var_name(var),
                values[var]
            ))
        })
    };

    let placements = instance
        .rectangles
        .iter()
        .enumerate()
        .map(|(i, rect)| {
            let rotated = layout
                .rotation
                .as_ref()
                .is_some_and(|r| values[r[i]] == 1);
            let (width, height) = rect.oriented(rotated);
            Ok(Placement {
                width,
                height,
                x: read(layout.x[i])?,
                y: read(layout.y[i])?,
                rotated,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let plate_height = match layout.height {
        HeightRef::Fixed(height) => height,
        HeightRef::Var(var) => read(var)?,
    };

    Ok(Packing {
        plate_width: instance.plate_width,
        plate_height,
        placements,
    })
}

/// Checks that `packing` places every item of `instance` once, in an allowed orientation,
/// inside the plate and without overlap.
pub fn verify_packing(instance: &Instance, packing: &Packing) -> Result<()> {
    if packing.plate_width != instance.plate_width {
        return Err(violation(format!(
            "plate width {} differs from instance width {}",
            packing.plate_width, instance.plate_width
        )));
    }
    if packing.placements.len() != instance.len() {
        return Err(violation(format!(
            "{} placements for {} items",
            packing.placements.len(),
            instance.len()
        )));
    }

    for (i, (p, rect)) in packing.placements.iter().zip(&instance.rectangles).enumerate() {
        if p.rotated && !instance.rotation {
            return Err(violation(format!("item {i} rotated without rotation enabled")));
        }
        if p.rotated && rect.is_square() {
            return Err(violation(format!("square item {i} marked as rotated")));
        }
        if (p.width, p.height) != rect.oriented(p.rotated) {
            return Err(violation(format!(
                "item {i} placed as {}x{} but is {}x{}",
                p.width, p.height, rect.width, rect.height
            )));
        }
        if u64::from(p.x) + u64::from(p.width) > u64::from(packing.plate_width)
            || u64::from(p.y) + u64::from(p.height) > u64::from(packing.plate_height)
        {
            return Err(violation(format!(
                "item {i} at ({}, {}) leaves the {}x{} plate",
                p.x, p.y, packing.plate_width, packing.plate_height
            )));
        }
    }

    for (i, a) in packing.placements.iter().enumerate() {
        for (j, b) in packing.placements.iter().enumerate().skip(i + 1) {
            if a.overlaps(b) {
                return Err(violation(format!("items {i} and {j} overlap")));
            }
        }
    }

    Ok(())
}

fn violation(message: String) -> PackingError {
    PackingError::DecodeInvariantViolation(message)
}
