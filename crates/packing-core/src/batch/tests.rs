use super::*;
use crate::engine::SatEngine;
use crate::search::SearchMode;

#[test]
fn test_batch_keeps_order_and_isolates_failures() {
    let instances = vec![
        Instance::new("1", 4, vec![Rectangle::new(2, 2), Rectangle::new(2, 2)]),
        Instance::new("2", 4, vec![Rectangle::new(5, 1)]),
        Instance::new("3", 8, vec![Rectangle::new(2, 3), Rectangle::new(3, 2)]),
        Instance::new("4", 4, vec![Rectangle::new(5, 1)]).with_rotation(true),
    ];
    let config = SearchConfig {
        mode: SearchMode::Scan,
        time_budget_secs: 30.0,
        ..SearchConfig::default()
    };

    let results = solve_batch(&instances, &config, |_| SatEngine::new());

    let ids: Vec<&str> = results.iter().map(|r| r.instance_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4"]);
    assert_eq!(results[0].plate_height(), Some(2));
    assert_eq!(results[1].status, SolveStatus::Impossible);
    assert_eq!(results[2].plate_height(), Some(3));
    assert_eq!(results[3].plate_height(), Some(5));
}
