mod config;
mod error;
mod handlers;
mod model;
mod store;

use std::process;

use iron::prelude::Chain;
use iron::Iron;
use log::{error, info};
use logger::Logger;
use router::Router;

use crate::config::Config;
use crate::handlers::*;
use crate::store::PostStore;

/// Wire every route and middleware around `store`.
fn app(store: PostStore) -> Chain {
    let (logger_before, logger_after) = Logger::new(None);
    let handlers = Handlers::new(store);

    let mut router = Router::new();
    router.get("/", handlers.list.clone(), "index");
    router.post("/", handlers.create.clone(), "index_create");
    router.get("/api/posts", handlers.list, "list_posts");
    router.post("/api/posts", handlers.create, "create_post");
    router.get("/api/posts/search", handlers.search, "search_posts");
    router.get("/api/posts/order", handlers.sort, "sort_posts");
    router.get("/api/posts/:id", handlers.find, "find_post");
    router.put("/api/posts/:id", handlers.update, "update_post");
    router.delete("/api/posts/:id", handlers.delete, "delete_post");

    let mut chain = Chain::new(router);
    chain.link_before(logger_before); // Should be first!
    chain.link_after(NotFoundAfterMiddleware);
    chain.link_after(JsonAfterMiddleware);
    chain.link_after(CorsAfterMiddleware);
    chain.link_after(logger_after); // Should be last!
    chain
}

// RUST_LOG=info hermes_posts > logs 2>&1 &
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    let chain = app(PostStore::seeded());

    info!("listening on {}:{}", config.host, config.port);
    if let Err(e) = Iron::new(chain).http(config.address()) {
        error!("could not start server: {}", e);
        process::exit(1);
    }
}
