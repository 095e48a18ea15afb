use crate::handlers;
use crate::lobby::Lobby;
use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::web;
use actix_web::App;
use actix_web::HttpServer;
use std::sync::Arc;

/// Assembles the `actix-web` app: CORS wide open (the protocol has no
/// same-origin assumptions — any client speaking the wire format can
/// connect), request logging, and the three routes the whole server
/// exposes.
pub fn build_app(
    lobby: web::Data<Lobby>,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .wrap(Logger::default())
        .wrap(Cors::default().allow_any_origin().allow_any_method().allow_any_header())
        .app_data(lobby)
        .route("/health", web::get().to(handlers::health))
        .route("/rooms", web::post().to(handlers::create_room))
        .route("/ws", web::get().to(handlers::ws_connect))
}

pub async fn serve(bind_addr: &str, storage: Arc<cr_records::InMemoryStorage>) -> std::io::Result<()> {
    let lobby = web::Data::new(Lobby::new(storage));
    log::info!("[hosting] listening on {bind_addr}");
    HttpServer::new(move || build_app(lobby.clone()))
        .workers(6)
        .bind(bind_addr)?
        .run()
        .await
}
