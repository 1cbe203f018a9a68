use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpMessage, HttpServer};
use async_graphql_actix_web::{GraphQLRequest, GraphQLResponse};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use content_api::middleware::{AuthContext, AuthGate};
use content_api::schema::{build_schema, AppSchema};
use content_api::security::TokenCodec;
use content_api::services::ContentService;
use content_api::{db, handlers, storage, Config};

/// GraphQL entry point. The authentication context attached by the gate is
/// forwarded into the request data so resolvers can see the caller.
async fn graphql_handler(
    schema: web::Data<AppSchema>,
    http_req: actix_web::HttpRequest,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let auth = http_req
        .extensions()
        .get::<AuthContext>()
        .copied()
        .unwrap_or_default();

    schema.execute(req.into_inner().data(auth)).await.into()
}

async fn schema_handler(schema: web::Data<AppSchema>) -> actix_web::HttpResponse {
    actix_web::HttpResponse::Ok()
        .content_type("text/plain")
        .body(schema.sdl())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,content_api=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!(env = %config.app.env, "starting content-api");

    let pool = match db::init_pool(&config.database.url, config.database.max_connections).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };
    info!("database pool ready, migrations applied");

    let store = match storage::build_store(&config.storage).await {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Failed to initialize image store: {}", e);
            std::process::exit(1);
        }
    };

    let codec = TokenCodec::new(&config.auth.jwt_secret, config.auth.token_ttl_secs);
    let service = ContentService::new(pool.clone(), store, codec.clone());
    let schema = build_schema(service.clone());

    let bind_addr = format!("{}:{}", config.app.host, config.app.port);
    info!("content-api listening on http://{}", bind_addr);

    let allowed_origins = config.cors.allowed_origins.clone();

    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec!["Authorization", "Content-Type"])
            .max_age(3600);

        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }

        App::new()
            .wrap(Logger::default())
            .wrap(AuthGate::new(codec.clone()))
            .wrap(cors)
            .app_data(web::Data::new(schema.clone()))
            .app_data(web::Data::new(service.clone()))
            .app_data(web::Data::new(pool.clone()))
            .route("/graphql", web::post().to(graphql_handler))
            .route("/graphql/schema", web::get().to(schema_handler))
            .service(handlers::images::upload_post_image)
            .service(handlers::health::health_check)
    })
    .bind(&bind_addr)?
    .workers(4)
    .run()
    .await
}
