use anyhow::Result;
use opero_core::gamification::calculate_level;

use super::utils::print_json;

pub fn run(xp: u32) -> Result<()> {
    print_json(&calculate_level(xp))
}
