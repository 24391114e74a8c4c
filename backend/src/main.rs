use std::sync::Arc;

use backend::catchers::{bad_request, forbidden, internal_error, not_found, unauthorized};
use backend::cors::CORS;
use backend::queries::PgPolls;
use backend::reconciler::VoteOutbox;
use backend::routes::{
    all_options, cast_public_vote, create_poll, create_workspace, delete_poll, delete_workspace,
    export_csv, export_json, get_poll, get_results, host_view, list_polls, list_shared_polls,
    list_workspaces, me, shared_view, update_poll, update_workspace, AppState,
};
use rocket::{catchers, routes};
use sqlx::postgres::PgPoolOptions;
use tokio::time::{interval, Duration};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Periodically redrives public votes whose durable write failed.
async fn run_outbox_task(outbox: Arc<VoteOutbox>, repo: PgPolls) {
    let mut interval = interval(Duration::from_secs(60));
    info!("Vote outbox retry task started");

    loop {
        interval.tick().await;
        if outbox.is_empty() {
            continue;
        }
        let delivered = outbox.flush(&repo).await;
        if delivered > 0 {
            info!("Recovered {delivered} queued votes");
        }
        let remaining = outbox.len();
        if remaining > 0 {
            error!("{remaining} queued votes still undelivered");
        }
    }
}

#[rocket::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting poll service");

    let database_url = std::env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations complete");

    let outbox = Arc::new(VoteOutbox::default());
    tokio::spawn(run_outbox_task(outbox.clone(), PgPolls::new(pool.clone())));

    let app_state = AppState::new(pool, outbox);

    let _rocket = rocket::build()
        .attach(CORS)
        .manage(app_state)
        .mount(
            "/api",
            routes![
                me,
                list_polls,
                list_shared_polls,
                create_poll,
                update_poll,
                delete_poll,
                get_poll,
                cast_public_vote,
                get_results,
                export_csv,
                export_json,
                shared_view,
                host_view,
                list_workspaces,
                create_workspace,
                update_workspace,
                delete_workspace,
                all_options
            ],
        )
        .register(
            "/",
            catchers![
                bad_request,
                unauthorized,
                forbidden,
                not_found,
                internal_error
            ],
        )
        .launch()
        .await?;

    Ok(())
}
