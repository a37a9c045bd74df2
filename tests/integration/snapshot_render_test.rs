use chrono::Local;
use sense::core::system_monitor::{MetricDescriptor, MetricInfo, MetricKind, MetricTree};
use sense::ui::render_text;
use std::collections::HashSet;

fn sample_tree() -> MetricTree {
    let descriptors = vec![
        MetricDescriptor::new(
            "coretemp-hwmon1",
            "Package id 0",
            MetricInfo::of_kind(MetricKind::Temperature),
        ),
        MetricDescriptor::new(
            "coretemp-hwmon1",
            "A label that is far too long",
            MetricInfo::of_kind(MetricKind::Temperature),
        ),
        MetricDescriptor::new(
            "GPU #0: NVIDIA GeForce RTX 3070",
            "Power Draw",
            MetricInfo::of_kind(MetricKind::Power),
        ),
    ];
    let mut tree = MetricTree::build(&descriptors, &HashSet::new(), 60);
    tree.update("coretemp-hwmon1", "Package id 0", 44.0);
    tree.update("coretemp-hwmon1", "Package id 0", 46.0);
    tree.update("GPU #0: NVIDIA GeForce RTX 3070", "Power Draw", 36.7);
    tree
}

#[test]
fn test_text_output_layout() {
    let snapshot = sample_tree().snapshot(2, Local::now());
    let text = render_text(&snapshot);
    let lines: Vec<_> = text.lines().collect();

    assert!(lines[0].contains("cur") && lines[0].contains("avg"));
    assert_eq!(lines[1], "coretemp-hwmon1");
    assert!(lines[2].starts_with("├ Package id 0"));
    assert!(lines[2].contains("46 °C"));
    assert!(lines[2].contains("44 °C"));
    assert!(lines[2].contains("45 °C"));
    assert!(lines[3].starts_with("└ A label that is…"));
    assert!(lines[3].trim_end().ends_with("- °C"));
    assert_eq!(lines[4], "");
    assert_eq!(lines[5], "GPU #0: NVIDIA GeForce RTX 3070");
    assert!(lines[6].contains("36.700 W"));
}

#[test]
fn test_json_snapshot_shape() {
    let snapshot = sample_tree().snapshot(2, Local::now());
    let value = serde_json::to_value(&snapshot).unwrap();

    assert_eq!(value["cycle"], 2);
    assert!(value["taken_at"].is_string());
    assert_eq!(value["groups"][0]["name"], "coretemp-hwmon1");
    assert_eq!(value["groups"][0]["rows"][0]["label"], "Package id 0");
    assert_eq!(
        value["groups"][0]["rows"][0]["max"].as_str().unwrap().trim(),
        "46 °C"
    );
    assert_eq!(value["groups"][1]["rows"][0]["avg"].as_str().unwrap().trim(), "36.700 W");
}

#[test]
fn test_empty_tree_renders_header_only() {
    let tree = MetricTree::build(&Vec::<MetricDescriptor>::new(), &HashSet::new(), 10);
    let text = render_text(&tree.snapshot(0, Local::now()));

    assert_eq!(text.lines().count(), 1);
}
