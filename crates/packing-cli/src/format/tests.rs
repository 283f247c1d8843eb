use super::*;
use packing_core::Placement;

#[test]
fn test_parse_instance_text() {
    let text = "8\n2\n2 3\n3 2\n";
    let instance = parse_instance_text("1", text).unwrap();

    assert_eq!(instance.id, "1");
    assert_eq!(instance.plate_width, 8);
    assert_eq!(
        instance.rectangles,
        vec![Rectangle::new(2, 3), Rectangle::new(3, 2)]
    );
    assert!(!instance.rotation);
}

#[test]
fn test_parse_tolerates_layout() {
    let instance = parse_instance_text("x", "  4 1\r\n\r\n 2  2 ").unwrap();
    assert_eq!(instance.rectangles, vec![Rectangle::new(2, 2)]);
}

#[test]
fn test_parse_rejects_malformed_text() {
    assert!(parse_instance_text("1", "").is_err());
    assert!(parse_instance_text("1", "8\n2\n2 3\n").is_err());
    assert!(parse_instance_text("1", "8\n1\n2 x\n").is_err());
    assert!(parse_instance_text("1", "8\n1\n2 3\n4 4\n").is_err());
    assert!(parse_instance_text("1", "8\n1\n-2 3\n").is_err());
}

#[test]
fn test_instance_id_from_path() {
    assert_eq!(instance_id(Path::new("data/ins-12.txt")), "12");
    assert_eq!(instance_id(Path::new("custom.json")), "custom");
}

#[test]
fn test_render_solution() {
    let packing = Packing {
        plate_width: 8,
        plate_height: 3,
        placements: vec![
            Placement {
                width: 2,
                height: 3,
                x: 0,
                y: 0,
                rotated: false,
            },
            Placement {
                width: 2,
                height: 3,
                x: 2,
                y: 0,
                rotated: true,
            },
        ],
    };
    assert_eq!(render_solution(&packing), "8 3\n2\n2 3 0 0\n2 3 2 0\n");
    assert_eq!(
        solution_path(Path::new("out"), "4"),
        Path::new("out").join("out-4.txt")
    );
}

#[test]
fn test_collect_inputs_orders_by_number() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["ins-10.txt", "ins-2.txt", "ins-1.json", "notes.txt", "ins-3.csv"] {
        std::fs::write(dir.path().join(name), "").unwrap();
    }

    let names: Vec<String> = collect_inputs(dir.path())
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["ins-1.json", "ins-2.txt", "ins-10.txt"]);
}

#[test]
fn test_load_instance_by_extension() {
    let dir = tempfile::tempdir().unwrap();

    let text = dir.path().join("ins-5.txt");
    std::fs::write(&text, "4\n1\n5 1\n").unwrap();
    let instance = load_instance(&text).unwrap();
    assert_eq!(instance.id, "5");
    assert_eq!(instance.rectangles, vec![Rectangle::new(5, 1)]);

    let yaml = dir.path().join("ins-6.yaml");
    std::fs::write(
        &yaml,
        "id: six\nplate_width: 4\nrotation: true\nrectangles:\n  - width: 5\n    height: 1\n",
    )
    .unwrap();
    let instance = load_instance(&yaml).unwrap();
    assert_eq!(instance.id, "six");
    assert!(instance.rotation);

    let json = dir.path().join("ins-7.json");
    std::fs::write(
        &json,
        r#"{"id": "7", "plate_width": 4, "rectangles": [{"width": 2, "height": 2}]}"#,
    )
    .unwrap();
    let instance = load_instance(&json).unwrap();
    assert!(!instance.rotation);
    assert_eq!(instance.plate_width, 4);

    assert!(load_instance(&dir.path().join("missing.txt")).is_err());
}
