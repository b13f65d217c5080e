use sheetforge_core::Config;

// Use mimalloc as the global allocator for better performance and lower
// fragmentation, especially when running on musl-based systems inside
// containers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // .env is optional; real deployments set the environment directly.
    dotenvy::dotenv().ok();

    sheetforge_api::setup::init_tracing();

    let config = Config::from_env()?;

    let (_state, router) = sheetforge_api::setup::initialize_app(config.clone()).await?;

    sheetforge_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
