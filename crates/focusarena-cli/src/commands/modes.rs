use focusarena_core::FocusMode;

use super::{print_json, CommandResult};

pub fn run() -> CommandResult {
    let specs: Vec<_> = FocusMode::ALL.iter().map(|mode| mode.spec()).collect();
    print_json(&specs)
}
