use actix_web::{web, App, HttpServer, HttpResponse};
use std::sync::Arc;
use crate::criteria::SearchCriteria;
use crate::error::AppError;
use crate::orchestrator::{Orchestrator, RunSource};

async fn search_news(
    orchestrator: web::Data<Arc<Orchestrator>>,
    query: web::Query<SearchCriteria>,
) -> Result<HttpResponse, AppError> {
    log::debug!("Received search request: {:?}", query);

    let outcome = orchestrator.run(RunSource::Criteria(query.into_inner())).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/search").route(web::get().to(search_news)));
}

pub async fn start_web_server(port: u16, orchestrator: Arc<Orchestrator>) -> std::io::Result<()> {
    let orchestrator_data = web::Data::new(orchestrator);

    log::info!("Starting web server on port: {}", port);

    HttpServer::new(move || {
        App::new()
            .app_data(orchestrator_data.clone())
            .configure(routes)
    })
    .bind(format!("0.0.0.0:{}", port))?
    .run()
    .await
}
