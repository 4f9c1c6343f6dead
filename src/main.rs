use anyhow::Result;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use smart_tutor::{
    api::{create_router, AppState},
    config::{Config, LoggingConfig},
    log_system_event, Database, FlashcardService, GamificationService, LLMService, SpeechService,
    StudentService,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    let _guard = setup_logging(&config.logging)?;
    config.log_configuration_summary();
    config.validate()?;

    log_system_event!(startup, component = "server", "Starting Smart Tutor server");

    let db = Database::new(&config.database.url).await?;
    log_system_event!(startup, component = "database", "Database initialized successfully");

    let llm_service = LLMService::from_config(&config.llm);
    if let Some(llm) = &llm_service {
        info!(
            provider = llm.provider_name(),
            model = llm.model_name(),
            "Initialized generative model client"
        );
    }

    let speech_service = match SpeechService::from_config(&config.speech) {
        Some(speech) => Some(
            speech
                .resolve_default_voice(config.speech.voice_id.as_deref())
                .await,
        ),
        None => None,
    };
    if let Some(speech) = &speech_service {
        info!(voice_id = speech.default_voice_id(), "Initialized speech client");
    }

    let state = AppState {
        student_service: StudentService::new(db.clone()),
        flashcard_service: FlashcardService::new(db.clone()),
        gamification_service: GamificationService::new(db),
        llm_service,
        speech_service,
    };

    let app = Router::new()
        .merge(create_router(state))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn setup_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    use std::fs;
    use tracing_subscriber::fmt;

    let env_filter =
        EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = config.console_enabled.then(|| {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(true)
    });

    let mut guard = None;
    let file_layer = if config.file_enabled {
        fs::create_dir_all(&config.log_directory).unwrap_or_else(|e| {
            eprintln!("Warning: Could not create logs directory: {}", e);
        });

        let file_appender = tracing_appender::rolling::daily(&config.log_directory, "smart-tutor.log");
        let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(file_guard);

        // No ANSI colors in files
        Some(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false)
                .with_writer(non_blocking_file),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!(
        directory = %config.log_directory,
        file_enabled = config.file_enabled,
        "Logging initialized - daily rotation to smart-tutor.log"
    );

    Ok(guard)
}
