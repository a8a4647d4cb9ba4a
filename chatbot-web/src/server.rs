use std::io::Write;

use actix_web::{get, web, HttpResponse, HttpServer};
use chatbot::exemplars::question_answering::{ask, QaChain};
use log::{error, info};
use serde::Deserialize;

use crate::page;

pub struct AppState {
    pub chain: QaChain,
}

#[derive(Debug, Deserialize)]
pub struct AskQuery {
    #[serde(default)]
    pub question: Option<String>,
}

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().body("Ok")
}

/// Render the form; a non-empty question is answered on the same page.
#[get("/")]
pub async fn index(query: web::Query<AskQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, actix_web::Error> {
    let question = query.into_inner().question.unwrap_or_default();
    let answer = if question.is_empty() {
        None
    } else {
        let answer = ask(&app_state.chain, question.as_str()).await.map_err(|e| {
            error!("Failed to answer question: {:#}", e);
            actix_web::error::ErrorInternalServerError(format!("{:#}", e))
        })?;
        Some(answer)
    };
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(page::render(&question, answer.as_deref())))
}

/// Default level is info, overridable with `RUST_LOG`.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();
}

pub async fn startup(host: String, port: u16, app_state: AppState) -> std::io::Result<()> {
    let app_state = web::Data::new(app_state);

    info!("Starting server at http://{}:{}", host, port);

    HttpServer::new(move || {
        actix_web::App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(app_state.clone())
            .service(health)
            .service(index)
    })
    .workers(1)
    .bind((host, port))?
    .run()
    .await
}
