use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use clap::Parser;
use tracing::info;

use tumor_classifier::classifier::OnnxClassifier;
use tumor_classifier::config::Config;
use tumor_classifier::{configure, cors, AppState};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::parse();
    let settings = config.pipeline_settings();
    std::fs::create_dir_all(&settings.upload_dir).with_context(|| {
        format!(
            "could not create upload directory {}",
            settings.upload_dir.display()
        )
    })?;

    let classifier = OnnxClassifier::load(&config.model_path)
        .with_context(|| format!("could not load model {}", config.model_path.display()))?;
    let state = web::Data::new(AppState::new(Arc::new(classifier), settings));

    let (host, port) = config.bind_address();
    info!("Server running at http://{}:{}", host, port);

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors())
            .wrap(Logger::default())
            .configure(configure)
    });
    if let Some(workers) = config.workers {
        server = server.workers(workers);
    }

    server
        .bind((host.as_str(), port))
        .with_context(|| format!("could not bind {}:{}", host, port))?
        .run()
        .await?;

    Ok(())
}
