use std::net::SocketAddr;

use hyper_recipes::{actions, config::Config, routes};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = Config::load()?;
    let pool = actions::connect(&config).await?;
    let context = routes::Context::new(&config, pool.clone())?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let (addr, server) = warp::serve(routes::routes(context)).bind_with_graceful_shutdown(
        addr,
        async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {e}");
            }
            log::info!("Shutting down");
        },
    );

    log::info!("Listening on http://{addr}");
    server.await;
    pool.close().await;

    Ok(())
}
