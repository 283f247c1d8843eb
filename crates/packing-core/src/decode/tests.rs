use super::*;
use crate::engine::{SatEngine, SolvingEngine, Verdict};
use crate::model::{EncodingStrategy, ModelBuilder, ModelOptions};
use std::collections::BTreeMap;
use std::time::Duration;

fn two_squares() -> Instance {
    Instance::new("t", 4, vec![Rectangle::new(2, 2), Rectangle::new(2, 2)])
}

/// Every variable of `model` at 0, except the given ones.
fn named(model: &Model, overrides: &[(&str, i64)]) -> Assignment {
    let Model::Linear(linear) = model else {
        panic!("expected an arithmetic model");
    };
    let mut values: BTreeMap<String, i64> = linear
        .vars()
        .iter()
        .map(|decl| (decl.name.clone(), 0))
        .collect();
    for &(name, value) in overrides {
        values.insert(name.to_string(), value);
    }
    Assignment::Named(values)
}

fn placement(width: u32, height: u32, x: u32, y: u32) -> Placement {
    Placement {
        width,
        height,
        x,
        y,
        rotated: false,
    }
}

#[test]
fn test_decode_sat_answer() {
    let inst = two_squares();
    let model = ModelBuilder::new(&inst, EncodingStrategy::OrderSat, ModelOptions::default())
        .unwrap()
        .build_for_height(2);
    let Verdict::Feasible(assignment) = SatEngine::new()
        .solve(&model, Duration::from_secs(10))
        .unwrap()
    else {
        panic!("two 2x2 squares fit a 4x2 plate");
    };

    let packing = decode(&model, &inst, &assignment).unwrap();
    assert_eq!(packing.plate_height, 2);
    assert_eq!(packing.placements.len(), 2);
    let mut xs: Vec<u32> = packing.placements.iter().map(|p| p.x).collect();
    xs.sort_unstable();
    assert_eq!(xs, vec![0, 2]);
}

#[test]
fn test_decode_named_values() {
    let inst = two_squares();
    let model = ModelBuilder::new(&inst, EncodingStrategy::BigM, ModelOptions::default())
        .unwrap()
        .build_for_height(2);
    let assignment = named(&model, &[("x_1", 2), ("d_0_1_0", 1)]);

    let packing = decode(&model, &inst, &assignment).unwrap();
    assert_eq!(packing.placements[0], placement(2, 2, 0, 0));
    assert_eq!(packing.placements[1], placement(2, 2, 2, 0));
}

#[test]
fn test_decode_reads_parametric_height() {
    let inst = Instance::new("t", 2, vec![Rectangle::new(2, 1), Rectangle::new(2, 1)]);
    let bounds = crate::bounds::Bounds::compute(&inst).unwrap();
    let model = ModelBuilder::new(&inst, EncodingStrategy::Cumulative, ModelOptions::default())
        .unwrap()
        .build_parametric(bounds)
        .unwrap();
    let assignment = named(&model, &[("y_1", 1), ("below_0_1", 1), ("plate_height", 2)]);

    let packing = decode(&model, &inst, &assignment).unwrap();
    assert_eq!(packing.plate_height, 2);
    assert_eq!(packing.placements[1], placement(2, 1, 0, 1));
}

#[test]
fn test_overlap_is_a_violation() {
    let inst = two_squares();
    let model = ModelBuilder::new(&inst, EncodingStrategy::BigM, ModelOptions::default())
        .unwrap()
        .build_for_height(2);
    let assignment = named(&model, &[("x_1", 1)]);

    assert!(matches!(
        decode(&model, &inst, &assignment),
        Err(PackingError::DecodeInvariantViolation(_))
    ));
}

#[test]
fn test_missing_or_negative_values_are_violations() {
    let inst = two_squares();
    let model = ModelBuilder::new(&inst, EncodingStrategy::BigM, ModelOptions::default())
        .unwrap()
        .build_for_height(2);

    let missing = Assignment::Named(BTreeMap::from([("x_0".to_string(), 0)]));
    assert!(matches!(
        decode(&model, &inst, &missing),
        Err(PackingError::DecodeInvariantViolation(_))
    ));

    let negative = named(&model, &[("x_1", -2)]);
    assert!(matches!(
        decode(&model, &inst, &negative),
        Err(PackingError::DecodeInvariantViolation(_))
    ));
}

#[test]
fn test_empty_literal_answer_is_a_violation() {
    let inst = two_squares();
    let model = ModelBuilder::new(&inst, EncodingStrategy::OrderSat, ModelOptions::default())
        .unwrap()
        .build_for_height(2);

    assert!(matches!(
        decode(&model, &inst, &Assignment::Literals(Vec::new())),
        Err(PackingError::DecodeInvariantViolation(_))
    ));
}

#[test]
fn test_verify_packing_checks() {
    let inst = two_squares();
    let valid = Packing {
        plate_width: 4,
        plate_height: 2,
        placements: vec![placement(2, 2, 0, 0), placement(2, 2, 2, 0)],
    };
    assert!(verify_packing(&inst, &valid).is_ok());

    let outside = Packing {
        placements: vec![placement(2, 2, 0, 0), placement(2, 2, 3, 0)],
        ..valid.clone()
    };
    assert!(verify_packing(&inst, &outside).is_err());

    let too_few = Packing {
        placements: vec![placement(2, 2, 0, 0)],
        ..valid.clone()
    };
    assert!(verify_packing(&inst, &too_few).is_err());

    let wrong_dims = Packing {
        placements: vec![placement(2, 2, 0, 0), placement(1, 2, 2, 0)],
        ..valid.clone()
    };
    assert!(verify_packing(&inst, &wrong_dims).is_err());

    let mut rotated = valid.clone();
    rotated.placements[1].rotated = true;
    assert!(verify_packing(&inst, &rotated).is_err());
    assert!(verify_packing(&inst.clone().with_rotation(true), &rotated).is_err());
}

#[test]
fn test_verify_packing_rotation() {
    let inst = Instance::new("t", 3, vec![Rectangle::new(1, 3), Rectangle::new(3, 1)]);
    let packing = Packing {
        plate_width: 3,
        plate_height: 2,
        placements: vec![
            Placement {
                width: 3,
                height: 1,
                x: 0,
                y: 0,
                rotated: true,
            },
            placement(3, 1, 0, 1),
        ],
    };
    assert!(verify_packing(&inst, &packing).is_err());
    assert!(verify_packing(&inst.clone().with_rotation(true), &packing).is_ok());
}
