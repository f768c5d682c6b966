use anyhow::{Context, Result};
use poro_fvm::{Quantity, RunConfig, TimeStepper};
use std::time::Instant;

fn main() -> Result<()> {
    println!("=== Poroelastic Consolidation Demo ===\n");

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "demos/terzaghi.toml".to_string());
    let config = RunConfig::from_file(&path)
        .with_context(|| format!("loading run configuration from {}", path))?;
    config.print_summary();

    let problem = config.problem().context("validating run configuration")?;
    let fields = config
        .initial_fields(&problem)
        .context("building initial fields")?;
    println!("Problem: {}", problem.describe());

    let coefficients = problem.coefficients;
    println!(
        "  Consolidation coefficient: {:.4e} m²/s",
        coefficients.consolidation_coefficient()
    );
    println!(
        "  Advised minimum dt (collocated): {:.4e} s",
        coefficients.minimum_time_step(problem.mesh.h())
    );

    let steps = problem.mesh.steps;
    let report_every = ((steps - 1) / 10).max(1);
    let p_map = problem.mesh.map(Quantity::P).clone();

    let mut stepper = TimeStepper::new(problem, fields)?.with_verbose(config.verbose);

    println!("\nTime stepping ({} steps)...", steps - 1);
    let start = Instant::now();
    let history = stepper
        .run(|step, fields| {
            if step % report_every == 0 || step == steps - 1 {
                let p_max = p_map
                    .coordinates()
                    .iter()
                    .map(|&(r, c)| fields.p[(r, c)])
                    .fold(f64::NEG_INFINITY, f64::max);
                println!("  step {:5}: max p = {:.6e} Pa", step, p_max);
            }
        })
        .context("time stepping")?;
    let elapsed = start.elapsed().as_secs_f64();
    stepper.finish();

    let worst = history
        .iter()
        .map(|s| s.relative_residual)
        .fold(0.0_f64, f64::max);
    let solve_total: f64 = history.iter().map(|s| s.solve_time).sum();

    println!("\n=== Summary ===");
    println!("  Simulated time: {:.4e} s", stepper.time());
    println!("  Wall time: {:.3} s ({:.3} s in step solves)", elapsed, solve_total);
    println!("  Worst relative residual: {:.3e}", worst);

    let fields = stepper.fields();
    let top = fields.v.nrows() - 1;
    let settlement = (0..fields.v.ncols())
        .map(|c| fields.v[(top, c)])
        .fold(0.0_f64, |m, v| m.min(v));
    println!("  Largest top settlement: {:.6e} m", settlement);
    if let Some(p_macro) = stepper.get_macro_field() {
        println!("  Max fracture pressure: {:.6e} Pa", p_macro.max());
    }

    println!("\n✓ Run completed");
    Ok(())
}
