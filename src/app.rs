use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;

use bookshelf_db::{Database, DatabaseModule};
use bookshelf_kernel::{InitCtx, ModuleRegistry, Settings};

use crate::modules;

/// A fully wired application: store opened, modules registered, not yet serving.
pub struct Application {
    settings: Settings,
    registry: ModuleRegistry,
}

impl Application {
    /// Open the record store and register every module against it.
    pub fn build(settings: Settings) -> anyhow::Result<Self> {
        let database =
            Database::open(&settings.database).context("failed to open record store")?;

        let mut registry = ModuleRegistry::new();
        registry.register_core(Arc::new(DatabaseModule::new(database.clone())));
        modules::register_all(&mut registry, &database)?;

        Ok(Self { settings, registry })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// The complete HTTP surface, without binding a socket
    pub fn router(&self) -> Router {
        bookshelf_http::build_router(&self.registry, &self.settings)
    }

    /// Serve until Ctrl-C or SIGTERM.
    pub async fn run(self) -> anyhow::Result<()> {
        self.run_until(bookshelf_http::shutdown_signal()).await
    }

    /// Initialize and start every module, serve until `shutdown` resolves,
    /// then stop every module, flushing the store last.
    pub async fn run_until<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let ctx = InitCtx {
            settings: &self.settings,
        };
        self.registry.init_all(&ctx).await?;
        self.registry.start_all(&ctx).await?;

        let served = bookshelf_http::start_server(&self.registry, &self.settings, shutdown).await;
        // Stop even when serving failed, so the store is still flushed.
        let stopped = self.registry.stop_all().await;

        served?;
        stopped?;
        tracing::info!("bookshelf shut down cleanly");
        Ok(())
    }
}
