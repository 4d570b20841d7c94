use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};

use crate::boundaries::notify::LogNotifier;
use crate::boundaries::payment::LinkPaymentGateway;
use crate::boundaries::storage::LocalFileStorage;
use crate::db::establish_connection_pool;
use crate::models::config::ServerConfig;
use crate::repository::DieselRepository;
use crate::repository::draft::DieselDraftStore;
use crate::routes::admin::{list_submissions, show_submission, update_status};
use crate::routes::intake::{
    attach_file, certify, reattach_file, remove_file, resume_draft, set_active_category, set_step,
    start_draft, submit, update_draft,
};
use crate::routes::payment::confirm_payment;
use crate::services::orchestrator::SingleFlight;

pub mod boundaries;
pub mod db;
pub mod domain;
pub mod dto;
pub mod forms;
pub mod models;
pub mod pagination;
pub mod repository;
pub mod routes;
pub mod schema;
pub mod services;

/// Builds and runs the Actix-Web HTTP server using the provided configuration.
pub async fn run(server_config: ServerConfig) -> std::io::Result<()> {
    // Establish Diesel connection pool for the SQLite database.
    let pool = establish_connection_pool(&server_config.database_url).map_err(|e| {
        std::io::Error::other(format!("Failed to establish database connection: {e}"))
    })?;

    let repo = web::Data::new(DieselRepository::new(pool.clone()));
    let draft_store = web::Data::new(DieselDraftStore::new(pool));
    let payments = web::Data::new(LinkPaymentGateway::new(
        server_config.payment_page_url.clone(),
    ));
    let storage = web::Data::new(LocalFileStorage::new(
        server_config.storage_dir.clone(),
        server_config.storage_public_url.clone(),
    ));
    let notifier = web::Data::new(LogNotifier);
    let single_flight = web::Data::new(SingleFlight::default());

    let bind_address = (server_config.address.clone(), server_config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(middleware::Compress::default())
            .wrap(middleware::Logger::default())
            .service(
                web::scope("/api/v1")
                    .service(start_draft)
                    .service(resume_draft)
                    .service(update_draft)
                    .service(set_step)
                    .service(set_active_category)
                    .service(certify)
                    .service(attach_file)
                    .service(reattach_file)
                    .service(remove_file)
                    .service(submit)
                    .service(confirm_payment)
                    .service(list_submissions)
                    .service(show_submission)
                    .service(update_status),
            )
            .app_data(repo.clone())
            .app_data(draft_store.clone())
            .app_data(payments.clone())
            .app_data(storage.clone())
            .app_data(notifier.clone())
            .app_data(single_flight.clone())
            .app_data(web::Data::new(server_config.clone()))
    })
    .bind(bind_address)?
    .run()
    .await
}
