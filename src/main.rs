use steura::models::config::ServerConfig;
use steura::run;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let server_config = config::Config::builder()
        .set_default("address", "0.0.0.0")
        .map_err(|e| std::io::Error::other(format!("Failed to set default address: {e}")))?
        .set_default("port", 8080)
        .map_err(|e| std::io::Error::other(format!("Failed to set default port: {e}")))?
        .set_default("storage_dir", "./storage")
        .map_err(|e| std::io::Error::other(format!("Failed to set default storage dir: {e}")))?
        .add_source(config::File::with_name("config").required(false))
        .add_source(config::Environment::default())
        .build()
        .map_err(|e| std::io::Error::other(format!("Failed to load configuration: {e}")))?;

    let server_config: ServerConfig = server_config
        .try_deserialize()
        .map_err(|e| std::io::Error::other(format!("Invalid configuration: {e}")))?;

    run(server_config).await
}
