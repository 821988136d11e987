use anyhow::{Result, anyhow};
use opero_core::demo::{DemoAction, DemoDecision, check};
use strum::IntoEnumIterator;

use super::utils::print_json;

pub fn run(action: Option<&str>) -> Result<()> {
    match action {
        Some(name) => {
            let action: DemoAction = name
                .parse()
                .map_err(|_| anyhow!("Unknown demo action '{name}'"))?;
            print_json(&check(action, true))
        }
        None => {
            let table: Vec<DemoDecision> = DemoAction::iter().map(|a| check(a, true)).collect();
            print_json(&table)
        }
    }
}
