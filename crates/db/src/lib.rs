//! Embedded record store for Bookshelf.
//!
//! The store handle is opened once at startup, handed to whoever needs it,
//! and flushed by [`DatabaseModule`] when the application shuts down.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use bookshelf_kernel::settings::DatabaseSettings;
use bookshelf_kernel::{InitCtx, Module};

pub mod collection;
pub mod error;

pub use collection::Collection;
pub use error::{StoreError, StoreResult};

/// Handle to an open sled database. Cloning is cheap and shares the store.
#[derive(Clone)]
pub struct Database {
    db: sled::Db,
    flush_on_write: bool,
}

impl Database {
    /// Open (or create) the store described by `settings`.
    pub fn open(settings: &DatabaseSettings) -> StoreResult<Self> {
        let mut config = sled::Config::new().temporary(settings.temporary);
        if !settings.temporary {
            config = config.path(&settings.path);
        }

        let db = config.open()?;
        tracing::info!(
            target: "bookshelf-db",
            path = %settings.path.display(),
            temporary = settings.temporary,
            recovered = db.was_recovered(),
            "record store opened"
        );

        Ok(Self {
            db,
            flush_on_write: settings.flush_on_write,
        })
    }

    /// Throwaway store, removed when the last handle is dropped.
    pub fn temporary() -> StoreResult<Self> {
        Self::open(&DatabaseSettings::temporary())
    }

    /// Open the named collection, creating it on first use.
    pub fn collection<T>(&self, name: &str) -> StoreResult<Collection<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        let tree = self.db.open_tree(name)?;
        Ok(Collection::new(name, tree, self.flush_on_write))
    }

    /// Durably write every pending change. Returns the number of bytes flushed.
    pub async fn flush(&self) -> StoreResult<usize> {
        Ok(self.db.flush_async().await?)
    }
}

/// Core module owning the store's shutdown: flushes once every custom
/// module has stopped.
pub struct DatabaseModule {
    database: Database,
}

impl DatabaseModule {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl Module for DatabaseModule {
    fn name(&self) -> &'static str {
        "db"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            flush_on_write = ctx.settings.database.flush_on_write,
            "record store ready"
        );
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        let flushed = self.database.flush().await?;
        tracing::info!(module = self.name(), bytes = flushed, "record store flushed");
        Ok(())
    }
}
