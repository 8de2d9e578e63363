use super::Hub;
use super::Session;
use crate::Unique;
use crate::matchmaker::Matchmaker;
use crate::records::Event;
use crate::records::Recorder;
use actix_cors::Cors;
use actix_web::App;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::HttpServer;
use actix_web::Responder;
use actix_web::middleware::Logger;
use actix_web::web;
use serde::Deserialize;
use std::sync::Arc;

/// Shared handles handed to every route.
struct Lobby {
    hub: Hub,
    matchmaker: Arc<Matchmaker>,
}

#[derive(Deserialize)]
struct ConnectQuery {
    #[serde(default)]
    username: String,
}

pub struct Server;

impl Server {
    pub async fn run(bind: &str, workers: usize) -> Result<(), std::io::Error> {
        let recorder = Recorder::logbook();
        let sink = recorder.sink.clone();
        let matchmaker = Arc::new(Matchmaker::with_on_start(Box::new(move |game| {
            let sink = sink.clone();
            tokio::spawn(async move {
                let (id, vs_bot) = {
                    let game = game.read().await;
                    (game.id(), game.vs_bot())
                };
                sink.emit(Event::started(id, vs_bot)).await;
            });
        })));
        let hub = Hub::spawn(matchmaker.clone(), recorder);
        let lobby = web::Data::new(Lobby { hub, matchmaker });
        log::info!("starting game server on {}", bind);
        HttpServer::new(move || {
            App::new()
                .wrap(Logger::new("%r %s %Ts"))
                .wrap(
                    Cors::default()
                        .allow_any_origin()
                        .allow_any_method()
                        .allow_any_header(),
                )
                .app_data(lobby.clone())
                .route("/ws", web::get().to(connect))
                .route("/health", web::get().to(health))
                .route("/stats", web::get().to(stats))
        })
        .workers(workers)
        .bind(bind)?
        .run()
        .await
    }
}

async fn connect(
    lobby: web::Data<Lobby>,
    query: web::Query<ConnectQuery>,
    body: web::Payload,
    req: HttpRequest,
) -> impl Responder {
    let name = query.into_inner().username.trim().to_string();
    if name.is_empty() {
        return HttpResponse::BadRequest()
            .body("username query parameter is required")
            .map_into_right_body();
    }
    match actix_ws::handle(&req, body) {
        Ok((response, ws, stream)) => {
            Session::spawn(&name, lobby.hub.clone(), lobby.matchmaker.clone(), ws, stream);
            response.map_into_left_body()
        }
        Err(e) => HttpResponse::InternalServerError()
            .body(e.to_string())
            .map_into_right_body(),
    }
}

async fn health() -> impl Responder {
    HttpResponse::Ok().body("OK")
}

async fn stats(lobby: web::Data<Lobby>) -> impl Responder {
    let waiting = lobby.matchmaker.waiting_count().await;
    let active = lobby.matchmaker.active_count().await;
    HttpResponse::Ok().json(serde_json::json!({ "waiting": waiting, "active": active }))
}
