use anyhow::Result;

mod app;

use app::App;

#[tokio::main]
async fn main() -> Result<()> {
    dhv_core::init()?;

    let (config, _validation) = dhv_core::Config::load_validated()?;
    let mut app = App::new(config).map_err(|e| {
        tracing::error!("{}", e.user_message());
        e
    })?;

    tracing::info!(
        "DHV weather started, data in {}",
        app.config().config_dir.display()
    );
    app.start();

    tokio::signal::ctrl_c().await?;
    app.shutdown();

    Ok(())
}
