#[tokio::main]
async fn main() -> anyhow::Result<()> {
    staffsight_observability::init();

    let config = staffsight_api::config::ApiConfig::from_env();

    let app = staffsight_api::app::build_app(&config)?;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
