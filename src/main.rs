use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::sync::Arc;
use std::time::Duration;

use studio_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::{Mailer, SmtpMailer, StripeService},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    let config = Config::from_toml().expect("Failed to load configuration file");

    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.access_token_expires_in);

    // External services
    let stripe_service = StripeService::new(config.stripe.clone(), &config.app.base_url);
    let mailer: Arc<dyn Mailer> =
        Arc::new(SmtpMailer::new(&config.smtp).expect("Failed to configure SMTP transport"));
    let account_store: Arc<dyn AccountStore> = Arc::new(SeaOrmAccountStore::new(pool.clone()));

    let auth_service = AuthService::new(pool.clone(), jwt_service.clone());
    let credential_service =
        CredentialService::new(account_store, mailer.clone(), &config.app.base_url);
    let payment_service = PaymentService::new(pool.clone(), stripe_service.clone());
    let newsletter_service = NewsletterService::new(pool.clone(), mailer.clone());
    let contact_service = ContactService::new(mailer, config.contact_recipient());

    let subscription_sync = SubscriptionSyncService::new(pool.clone(), stripe_service.clone());
    let throttle = Arc::new(RefreshThrottle::new(
        Arc::new(subscription_sync),
        Duration::from_secs(config.refresh.min_interval_secs),
        Duration::from_secs(config.refresh.call_timeout_secs),
    ));

    tasks::spawn_all(throttle.clone());

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .app_data(handlers::json_config())
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(credential_service.clone()))
            .app_data(web::Data::new(payment_service.clone()))
            .app_data(web::Data::new(newsletter_service.clone()))
            .app_data(web::Data::new(contact_service.clone()))
            .app_data(web::Data::new(stripe_service.clone()))
            .app_data(web::Data::from(throttle.clone()))
            .configure(swagger_config)
            .configure(handlers::webhook_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::auth_config)
                    .configure(handlers::payment_config)
                    .configure(handlers::session_config)
                    .configure(handlers::newsletter_config)
                    .configure(handlers::contact_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
