use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use blog_service::cache::{MemoryQueryCache, QueryCache, RedisQueryCache};
use blog_service::config::{Config, CorsConfig};
use blog_service::db::{run_migrations, PgBlogStore};
use blog_service::{handlers, BlogActions};
use cache_invalidation::{InvalidationPublisher, LogOnlyRevalidator, Revalidator};
use db_pool::{close_pool, create_pool, DbConfig};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SERVICE_NAME: &str = "blog-service";

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing(json: bool) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

fn build_cors(config: &CorsConfig) -> Cors {
    let mut cors = Cors::default();
    for origin in &config.allowed_origins {
        if origin == "*" {
            cors = cors.allow_any_origin();
        } else {
            cors = cors.allowed_origin(origin);
        }
    }
    cors.allow_any_method().allow_any_header().max_age(3600)
}

/// Redis-backed cache and revalidation when configured, in-process otherwise
async fn build_collaborators(
    config: &Config,
) -> anyhow::Result<(Arc<dyn QueryCache>, Arc<dyn Revalidator>)> {
    let Some(redis_url) = config.cache.redis_url.as_deref() else {
        tracing::warn!("REDIS_URL not set; using in-process query cache and log-only revalidation");
        return Ok((
            Arc::new(MemoryQueryCache::new()),
            Arc::new(LogOnlyRevalidator::new(SERVICE_NAME)),
        ));
    };

    let cache = RedisQueryCache::new(redis_url)
        .await
        .context("Failed to connect query cache to Redis")?;
    let publisher = InvalidationPublisher::with_channel(
        redis_url,
        SERVICE_NAME.to_string(),
        config.cache.invalidation_channel.clone(),
    )
    .await
    .context("Failed to connect revalidation publisher to Redis")?;

    tracing::info!(
        channel = %publisher.channel(),
        "Using Redis query cache and revalidation publisher"
    );

    Ok((Arc::new(cache), Arc::new(publisher)))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.app.env.is_production());

    tracing::info!("Starting {} v{}", SERVICE_NAME, env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let db_config =
        DbConfig::for_environment(SERVICE_NAME, config.app.env.as_str(), &config.database.url);
    db_config.log_config();

    let pool = create_pool(db_config)
        .await
        .context("Failed to create database pool")?;
    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let (cache, revalidator) = build_collaborators(&config).await?;
    let store = Arc::new(PgBlogStore::new(pool.clone()));
    let actions = web::Data::new(BlogActions::new(store, cache, revalidator));

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Listening on {}", bind_address);

    let cors_config = config.cors.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(actions.clone())
            .wrap(build_cors(&cors_config))
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .disable_signals()
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let result = tokio::select! {
        joined = server_task => {
            match joined {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(anyhow::Error::new(e).context("HTTP server failed")),
                Err(e) => Err(anyhow::Error::new(e).context("HTTP server task panicked")),
            }
        }
        _ = &mut shutdown => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
            Ok(())
        }
    };

    close_pool(&pool, SERVICE_NAME).await;
    tracing::info!("{} shut down", SERVICE_NAME);

    result
}
