use anyhow::Context;
use bookshelf_app::Application;
use bookshelf_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load Bookshelf settings")?;
    bookshelf_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.path.display(),
        "bookshelf-app bootstrap starting"
    );

    let app = Application::build(settings)?;
    tracing::info!("bookshelf-app bootstrap complete");

    app.run().await
}
