//! Strip footing on a dual-porosity block, run from the shipped demo input
//!
//! The north side is loaded and sealed on x ∈ [0, 1.5] and drained beyond.
//! The footing settles, and the sealed span holds more pressure than the
//! drained one.

use poro_fvm::{Quantity, RunConfig, TimeStepper};

const DEMO: &str = "demos/strip_footing.toml";

fn demo_config(arrangement: &str, scheme: &str) -> RunConfig {
    let text = std::fs::read_to_string(DEMO).unwrap();
    let text = text
        .replace("arrangement = \"collocated\"", &format!("arrangement = \"{}\"", arrangement))
        .replace("scheme = \"stabilized\"", &format!("scheme = \"{}\"", scheme));
    RunConfig::from_toml_str(&text).unwrap()
}

fn check_footing(config: &RunConfig) {
    let problem = config.problem().unwrap();
    let fields = config.initial_fields(&problem).unwrap();
    let label = problem.describe();
    let mut stepper = TimeStepper::new(problem, fields).unwrap();

    let mut first = None;
    let history = stepper
        .run(|step, fields| {
            if step == 1 {
                first = Some(fields.clone());
            }
        })
        .unwrap();
    assert_eq!(history.len(), stepper.problem().mesh.steps - 1);
    for stats in &history {
        assert!(stats.relative_residual < 1e-8, "{}: {:?}", label, stats);
    }

    let mesh = &stepper.problem().mesh;

    // Settlement under the footing exceeds that at the free far edge
    let v_map = mesh.map(Quantity::V);
    let top = v_map.rows() - 1;
    let v = &stepper.fields().v;
    let loaded = v[(top, 0)];
    let free = v[(top, v_map.cols() - 1)];
    assert!(loaded < 0.0, "{}: footing v = {}", label, loaded);
    assert!(loaded < free, "{}: footing v = {}, free edge v = {}", label, loaded, free);

    // Right after loading, the sealed span holds more pressure than the drained one
    let first = first.unwrap();
    let p_map = mesh.map(Quantity::P);
    let top = p_map.rows() - 1;
    let last = p_map.cols() - 1;
    for q in [Quantity::P, Quantity::PMacro] {
        let p = first.get(q).unwrap();
        assert!(p[(top, 0)] > 0.0, "{}: sealed {} = {}", label, q, p[(top, 0)]);
        assert!(
            p[(top, 0)] > p[(top, last)],
            "{}: sealed {} = {}, drained {} = {}",
            label,
            q,
            p[(top, 0)],
            q,
            p[(top, last)]
        );
    }
}

#[test]
fn test_demo_strip_footing_collocated() {
    let config = RunConfig::from_file(DEMO).unwrap();
    assert!(config.boundary.strip.is_some());
    check_footing(&config);
}

#[test]
fn test_strip_footing_staggered() {
    check_footing(&demo_config("staggered", "none"));
}

#[test]
fn test_strip_footing_centered() {
    check_footing(&demo_config("collocated", "centered"));
}
