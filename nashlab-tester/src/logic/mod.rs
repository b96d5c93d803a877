pub mod choices;
pub mod reports;
pub mod scenarios;
pub mod seeds;
pub mod tester;

pub use choices::{describe_choice, parse_choices};
pub use reports::RunReport;
pub use scenarios::{expand_scenarios, find_scenario, list_scenarios};
pub use seeds::{SeedInfo, resolve_seed_inputs};
pub use tester::*;
