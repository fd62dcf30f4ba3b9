pub mod books;

use anyhow::Context;
use bookshelf_db::Database;
use bookshelf_kernel::ModuleRegistry;

/// Register all domain modules, each wired to the shared store handle
pub fn register_all(registry: &mut ModuleRegistry, database: &Database) -> anyhow::Result<()> {
    let books = books::create_module(database).context("failed to open books collection")?;
    registry.register_custom(books);
    Ok(())
}
