use super::*;
use crate::decode::verify_packing;
use proptest::prelude::*;

fn rects(dims: &[(u32, u32)]) -> Vec<Rectangle> {
    dims.iter().map(|&(w, h)| Rectangle::new(w, h)).collect()
}

#[test]
fn test_side_by_side_bounds() {
    let instance = Instance::new("1", 8, rects(&[(2, 3), (3, 2)]));
    let bounds = Bounds::compute(&instance).unwrap();

    // area bound is 2, the tallest item forces 3
    assert_eq!(bounds.lower, 3);
    assert_eq!(bounds.upper, 3);
}

#[test]
fn test_area_bound_rounds_up() {
    let instance = Instance::new("area", 4, rects(&[(3, 1), (3, 1), (3, 1)]));
    let bounds = Bounds::compute(&instance).unwrap();

    assert_eq!(bounds.lower, 3);
    assert!(bounds.upper >= bounds.lower);
}

#[test]
fn test_upper_bound_drops_shortest_when_it_fits_beside() {
    let instance = Instance::new("ub", 10, rects(&[(4, 5), (3, 2), (5, 4)]));
    let bounds = Bounds::compute(&instance).unwrap();

    assert_eq!(bounds.upper, 5 + 4);
}

#[test]
fn test_upper_bound_keeps_shortest_when_nothing_fits_beside() {
    let instance = Instance::new("wide", 4, rects(&[(4, 1), (4, 1)]));
    let bounds = Bounds::compute(&instance).unwrap();

    assert_eq!(bounds.lower, 2);
    assert_eq!(bounds.upper, 2);
}

#[test]
fn test_single_item_upper_bound_is_its_height() {
    let instance = Instance::new("one", 6, rects(&[(3, 4)]));
    let bounds = Bounds::compute(&instance).unwrap();

    assert_eq!(bounds, Bounds { lower: 4, upper: 4 });
    assert_eq!(bounds.heights().count(), 1);
}

#[test]
fn test_too_wide_item_is_impossible() {
    let instance = Instance::new("2", 4, rects(&[(5, 1)]));
    let err = Bounds::compute(&instance).unwrap_err();

    assert!(matches!(
        err,
        PackingError::ImpossibleInstance {
            index: 0,
            width: 5,
            height: 1,
            plate_width: 4
        }
    ));
}

#[test]
fn test_rotation_makes_wide_item_fit() {
    let instance = Instance::new("3", 4, rects(&[(5, 1)])).with_rotation(true);
    let bounds = Bounds::compute(&instance).unwrap();

    assert_eq!(bounds, Bounds { lower: 5, upper: 5 });

    let stacked = Bounds::stacked_packing(&instance).unwrap();
    assert!(stacked.placements[0].rotated);
    assert_eq!(stacked.placements[0].width, 1);
}

#[test]
fn test_rotation_lowers_dimension_bound() {
    let instance = Instance::new("flat", 10, rects(&[(2, 7), (3, 1)])).with_rotation(true);
    let bounds = Bounds::compute(&instance).unwrap();

    // (2, 7) may lie flat, so only the area bound remains
    assert_eq!(bounds.lower, 2);
}

#[test]
fn test_invalid_instances_are_rejected() {
    let empty = Instance::new("empty", 4, Vec::new());
    assert!(matches!(
        Bounds::compute(&empty),
        Err(PackingError::InvalidInstance(_))
    ));

    let zero_width = Instance::new("zw", 0, rects(&[(1, 1)]));
    assert!(matches!(
        Bounds::compute(&zero_width),
        Err(PackingError::InvalidInstance(_))
    ));

    let zero_item = Instance::new("zi", 4, rects(&[(1, 0)]));
    assert!(matches!(
        Bounds::compute(&zero_item),
        Err(PackingError::InvalidInstance(_))
    ));
}

fn instance_strategy() -> impl Strategy<Value = Instance> {
    (1u32..16, any::<bool>())
        .prop_flat_map(|(plate_width, rotation)| {
            let item = (1u32..=plate_width, 1u32..12);
            (
                Just(plate_width),
                Just(rotation),
                prop::collection::vec(item, 1..8),
            )
        })
        .prop_map(|(plate_width, rotation, dims)| {
            Instance::new("prop", plate_width, rects(&dims)).with_rotation(rotation)
        })
}

proptest! {
    #[test]
    fn prop_lower_never_exceeds_upper(instance in instance_strategy()) {
        let bounds = Bounds::compute(&instance).unwrap();
        prop_assert!(bounds.lower <= bounds.upper);
        prop_assert!(bounds.lower > 0);
    }

    #[test]
    fn prop_stacked_packing_is_valid(instance in instance_strategy()) {
        let stacked = Bounds::stacked_packing(&instance).unwrap();
        prop_assert!(verify_packing(&instance, &stacked).is_ok());

        let used: u64 = stacked
            .placements
            .iter()
            .map(|p| u64::from(p.width) * u64::from(p.height))
            .sum();
        prop_assert_eq!(used, instance.total_area());
    }
}
