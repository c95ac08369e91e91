// src/main.rs
use hookwatch::Result;

#[actix_web::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = hookwatch::run().await {
        log::error!("Fatal: {}", e);
        return Err(e);
    }
    Ok(())
}
