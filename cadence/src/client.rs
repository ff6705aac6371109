#[tracing::instrument(err)]
pub async fn run() -> Result<(), super::error::Run> {
    color_eyre::install()?;
    if let Err(error) = dotenvy::dotenv() {
        if !error.not_found() {
            return Err(error.into());
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| crate::error::InstallDefaultCryptoProvider)?;

    let config = super::core::model::Config::from_env()?;
    Ok(super::runner::start(config).await?)
}
