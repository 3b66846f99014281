use planopt::application::scenarios::service_network::Point;
use planopt::application::scenarios::{
    age_allocation, capacity_planning, client_selection, marketing_mix, regional_portfolio,
    service_network,
};
use planopt::domain::solver_service::SolveOptions;
use planopt::infrastructure::load_insurance_csv;
use planopt::solver::SolverFactory;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fmt::Display;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "insurance.csv".to_string());
    let mut store = load_insurance_csv(&path)?;
    let solver = SolverFactory::default_solver()?;
    let options = SolveOptions::default();

    // Each scenario owns its model; a failure in one never stops the rest.
    section("1. client selection for maximum revenue");
    report(client_selection::run(&store, solver.as_ref(), &options));

    section("2. regional portfolio balancing");
    report(regional_portfolio::run(&mut store, solver.as_ref(), &options));

    section("3. hospital capacity planning");
    report(capacity_planning::run(&mut store, solver.as_ref(), &options));

    section("4. allocation by age tier");
    report(age_allocation::run(&mut store, solver.as_ref(), &options));

    section("5. marketing budget split");
    report(marketing_mix::run(solver.as_ref(), &options));

    section("6. service network design");
    let (clients, centers) = sample_network_coordinates();
    report(service_network::run(&clients, &centers, solver.as_ref(), &options));

    println!("\n{}", "=".repeat(72));
    println!("prescriptive analysis complete");
    Ok(())
}

/// Deterministic sample coordinates for the network scenario: 5 candidate
/// centers and 50 client locations in a 100×100 grid, from a fixed seed.
fn sample_network_coordinates() -> (Vec<Point>, Vec<Point>) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut point = |rng: &mut ChaCha8Rng| {
        Point::new(rng.random_range(0.0..100.0), rng.random_range(0.0..100.0))
    };
    let centers: Vec<Point> = (0..5).map(|_| point(&mut rng)).collect();
    let clients: Vec<Point> = (0..50).map(|_| point(&mut rng)).collect();
    (clients, centers)
}

fn section(title: &str) {
    println!("\n{}", "=".repeat(72));
    println!("=== {title} ===");
    println!();
}

fn report<T: Display, E: Display>(result: Result<planopt::ScenarioResult<T>, E>) {
    match result {
        Ok(outcome) => println!("{outcome}"),
        Err(err) => tracing::error!(%err, "scenario failed"),
    }
}
