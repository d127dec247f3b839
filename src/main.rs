use std::{process, sync::Arc, time::Duration};

use landing_news::{
    application::{
        admin::{AdminPostService, AdminTaxonomyService},
        captcha::CaptchaStore,
        comments::CommentService,
        contact::ContactService,
        error::AppError,
        landing::LandingService,
        localization::Localization,
        news::NewsService,
        repos::{
            CommentsRepo, ContactRepo, FeedbackRepo, HealthRepo, PostsRepo, ProductsRepo,
            ReservationsRepo, TaxonomyRepo,
        },
        shop::ShopService,
    },
    cache::{CacheConfig, InvalidationCoordinator, build_content_cache},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState, HttpState, RouterState},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

const CAPTCHA_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn connect_pool(settings: &config::Settings) -> Result<sqlx::PgPool, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect_pool(&settings).await?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(target = "landing_news::migrate", "Migrations applied");
    Ok(())
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect_pool(&settings).await?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let repositories = Arc::new(PostgresRepositories::new(pool));

    let router_state = build_router_state(repositories, &settings).await?;
    let captcha = router_state.http.captcha.clone();
    let sweeper = tokio::spawn(async move {
        let mut interval = tokio::time::interval(CAPTCHA_SWEEP_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            captcha.purge_expired();
        }
    });

    if !router_state.api.is_enabled() {
        warn!(
            target = "landing_news::serve",
            "admin.token is not set; the admin API is disabled"
        );
    }

    let result = serve_http(&settings, router_state).await;

    sweeper.abort();
    let _ = sweeper.await;

    result
}

async fn build_router_state(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<RouterState, AppError> {
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let taxonomy_repo: Arc<dyn TaxonomyRepo> = repositories.clone();
    let comments_repo: Arc<dyn CommentsRepo> = repositories.clone();
    let reservations_repo: Arc<dyn ReservationsRepo> = repositories.clone();
    let feedback_repo: Arc<dyn FeedbackRepo> = repositories.clone();
    let contact_repo: Arc<dyn ContactRepo> = repositories.clone();
    let products_repo: Arc<dyn ProductsRepo> = repositories.clone();
    let health_repo: Arc<dyn HealthRepo> = repositories;

    let localization = Arc::new(Localization::new(
        settings.site.languages.clone(),
        settings.site.default_language.clone(),
        settings.site.display_timezone,
    )?);

    let cache = build_content_cache(&CacheConfig::from(&settings.cache)).await?;
    let invalidation = InvalidationCoordinator::new(cache.clone(), localization.clone());
    let captcha = Arc::new(CaptchaStore::new(settings.captcha.ttl));

    let comments = Arc::new(CommentService::new(
        posts_repo.clone(),
        comments_repo.clone(),
        captcha.clone(),
        invalidation.clone(),
    ));

    let http_state = HttpState {
        landing: Arc::new(LandingService::new(reservations_repo, feedback_repo)),
        contact: Arc::new(ContactService::new(contact_repo, captcha.clone())),
        news: Arc::new(NewsService::new(
            posts_repo.clone(),
            taxonomy_repo.clone(),
            comments_repo,
            cache,
            localization.clone(),
            settings.site.base_url.clone(),
        )),
        comments: comments.clone(),
        shop: Arc::new(ShopService::new(products_repo)),
        captcha,
        localization: localization.clone(),
        health: health_repo,
    };

    let api_state = ApiState {
        posts: Arc::new(AdminPostService::new(
            posts_repo,
            localization,
            invalidation,
        )),
        taxonomy: Arc::new(AdminTaxonomyService::new(taxonomy_repo)),
        comments,
        token: settings.admin.token.as_deref().map(Arc::from),
    };

    Ok(RouterState {
        http: http_state,
        api: api_state,
    })
}

async fn serve_http(settings: &config::Settings, state: RouterState) -> Result<(), AppError> {
    let app = http::build_app(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "landing_news::serve",
        addr = %settings.server.addr,
        "Listening"
    );

    let grace = settings.server.graceful_shutdown;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(grace))
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))
}

async fn shutdown_signal(grace: Duration) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(target = "landing_news::serve", error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(target = "landing_news::serve", error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!(
        target = "landing_news::serve",
        grace_secs = grace.as_secs(),
        "Shutdown signal received, draining connections"
    );
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        warn!(
            target = "landing_news::serve",
            "Graceful shutdown window elapsed, exiting"
        );
        process::exit(0);
    });
}
