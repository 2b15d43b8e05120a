use focusarena_core::Database;

use super::{print_json, CommandResult};

pub fn run() -> CommandResult {
    let db = Database::open()?;
    print_json(&db.profile()?)
}
