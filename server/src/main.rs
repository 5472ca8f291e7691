mod config;
mod routes;
mod seed;
mod state;

use actix_web::{middleware::Logger, web, App, HttpServer};
use chrono::Utc;
use clap::Parser;
use log::info;

use crate::config::Args;
use crate::state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let state = if args.no_seed {
        AppState::empty(args.latency())
    } else {
        let now = Utc::now();
        AppState::new(seed::tasks(now), seed::categories(now), args.latency())
    };
    let state = web::Data::new(state);
    info!("serving tasks and categories on {} ({:?} latency)", args.bind, state.latency);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(routes::configure)
    })
    .bind(args.bind.as_str())?
    .run()
    .await
}
