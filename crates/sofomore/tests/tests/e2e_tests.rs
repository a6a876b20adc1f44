#[path = "e2e/first_round.rs"]
mod first_round;

#[path = "e2e/restart_lifecycle.rs"]
mod restart_lifecycle;

#[path = "e2e/population_changes.rs"]
mod population_changes;

#[path = "e2e/gaussian_run.rs"]
mod gaussian_run;
