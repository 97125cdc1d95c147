use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vendor_tracker::{
    AppState,
    config::Config,
    middleware::{RateLimiter, rate_limit},
    router,
    store::{PgLocationStore, PgProfileStore},
};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    // 设置数据库连接池
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'vendor_tracker';")
                    .await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    // Redis 可选：用于限流和商户资料缓存
    let redis = config.redis_url.as_ref().map(|url| {
        Arc::new(redis::Client::open(url.as_str()).expect("Failed to create Redis client"))
    });
    if redis.is_none() {
        tracing::warn!("REDIS_URL not set, rate limiting and profile cache disabled");
    }

    tracing::info!(
        "Staleness window {}s, default radius {} mi",
        config.stale_after_secs,
        config.default_search_radius
    );

    let state = AppState::new(
        config.clone(),
        Arc::new(PgLocationStore::new(pool.clone())),
        Arc::new(PgProfileStore::new(pool, redis.clone())),
    );

    let app = router::build(state);
    let app = match redis {
        Some(client) => {
            let limiter = Arc::new(RateLimiter::new(client, config.clone()));
            app.layer(axum::middleware::from_fn_with_state(limiter, rate_limit))
        }
        None => app,
    };

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let app = {
        tracing::debug!("Adding CORS layer for development mode");
        app.layer(tower_http::cors::CorsLayer::permissive())
    };

    // 启动服务器
    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
