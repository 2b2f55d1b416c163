//! Runs the S1-S6 deterministic scenarios and reports pass/fail per
//! scenario. Exits non-zero if any scenario fails.

#[tokio::main]
async fn main() {
    println!("distrib-sim: running deterministic scenarios\n");

    let results = distrib_sim::run_all().await;

    let mut failures = 0;
    for result in &results {
        if result.passed() {
            println!("  [PASS] {}", result.name);
        } else {
            failures += 1;
            println!("  [FAIL] {}", result.name);
            if let Err(reason) = &result.outcome {
                println!("         {reason}");
            }
        }
    }

    println!(
        "\n{} of {} scenarios passed",
        results.len() - failures,
        results.len()
    );

    if failures > 0 {
        std::process::exit(1);
    }
}
