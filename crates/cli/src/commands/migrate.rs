use tutur_db::migrations;

use crate::commands::{with_migrated_pool, CommandResult};

pub fn run() -> CommandResult {
    with_migrated_pool("migrate", |_pool| async {
        Ok(format!(
            "applied pending migrations ({} versions known to this build)",
            migrations::known_versions()
        ))
    })
}
