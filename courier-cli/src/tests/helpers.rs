//! Test helpers for writing request files.

use camino::Utf8Path;
use serde_json::{Value, json};

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path.as_std_path(), contents).expect("write test file");
}

fn stop(name: &str, others: &[&str], demand: u32, high_priority: bool) -> Value {
    let distances: Vec<Value> = others
        .iter()
        .filter(|other| **other != name)
        .map(|other| json!({ "name": other, "distance": 5 }))
        .collect();
    json!({
        "name": name,
        "is_depot": name == "depot",
        "accessibility": ["truck"],
        "demand": demand,
        "service_time": 10,
        "high_priority": high_priority,
        "distances": distances,
    })
}

/// Depot and two stops of demand two, served by one truck.
pub(super) fn sample_request() -> Value {
    let names = ["depot", "a", "b"];
    json!({
        "locations": [
            stop("depot", &names, 0, false),
            stop("a", &names, 2, false),
            stop("b", &names, 2, false),
        ],
        "vehicles": [
            { "name": "truck", "types": ["truck"], "max_load_weight": 10 }
        ],
        "search_time_limit": 1,
    })
}

pub(super) fn write_request(path: &Utf8Path, request: &Value) {
    let payload = serde_json::to_vec_pretty(request).expect("serialize request");
    write_utf8(path, &payload);
}
