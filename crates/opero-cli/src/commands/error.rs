use anyhow::Result;
use opero_core::error::{BackendError, normalize};

use super::utils::print_json;

pub fn run(code: Option<String>, message: &str) -> Result<()> {
    let raw = match code {
        Some(code) => BackendError::new(code, message),
        None => BackendError::exception(message),
    };
    print_json(&normalize(&raw))
}
