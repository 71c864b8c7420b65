//! OneMax with a tie-breaking second objective.
//!
//! Runs one evolver to completion on the main thread, then interleaves
//! three differently seeded runs on a round-robin scheduler.
//!
//! ```sh
//! RUST_LOG=info cargo run --example onemax
//! ```

use rand::Rng;
use u_evolver::evolve::{Direction, EvolveProblem, Evolver, EvolverConfig, RunResult};
use u_evolver::scheduler::RoundRobin;

struct OneMax {
    len: usize,
    label: &'static str,
}

impl EvolveProblem for OneMax {
    type Gene = bool;

    fn generate<R: Rng>(&self, rng: &mut R) -> Vec<bool> {
        (0..self.len).map(|_| rng.random_bool(0.5)).collect()
    }

    /// Ones (maximize), then number of 0/1 switches (minimize).
    fn score(&self, genome: &[bool]) -> Vec<f64> {
        let ones = genome.iter().filter(|&&b| b).count();
        let switches = genome.windows(2).filter(|w| w[0] != w[1]).count();
        vec![ones as f64, switches as f64]
    }

    fn mutate<R: Rng>(&self, genome: &[bool], rng: &mut R) -> Vec<bool> {
        let mut out = genome.to_vec();
        let i = rng.random_range(0..out.len());
        out[i] = !out[i];
        out
    }

    fn on_new_best(&self, result: &RunResult<bool>) {
        println!(
            "[{}] generation {:>3}: {:?}",
            self.label, result.iterations, result.score
        );
    }

    fn on_final(&self, result: &RunResult<bool>) {
        println!(
            "[{}] done after {} iterations ({:?}): {:?}",
            self.label, result.iterations, result.reason, result.score
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = EvolverConfig::new(vec![Direction::Maximize, Direction::Minimize])
        .with_generation_size(200)
        .with_max_iterations(60);

    let result = Evolver::new(
        OneMax {
            len: 64,
            label: "solo",
        },
        config.clone().with_seed(1),
    )?
    .run()?;
    println!("solo best: {:?}\n", result.score);

    let scheduler = RoundRobin::new();
    for (seed, label) in [(2, "a"), (3, "b"), (4, "c")] {
        Evolver::new(OneMax { len: 64, label }, config.clone().with_seed(seed))?
            .start(Some(&scheduler))?;
    }
    let turns = scheduler.run_until_idle();
    println!("\nscheduler took {turns} turns");
    for (id, err) in scheduler.take_failures() {
        eprintln!("run {id} failed: {err}");
    }
    Ok(())
}
