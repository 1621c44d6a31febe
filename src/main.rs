use anyhow::{Context, Result};
use social_schema::db::{establish_pool, run_migrations, table_counts};
use social_schema::settings;
use social_schema::utils::{
    log_db_error, log_db_ready, log_db_status, log_migrations_applied, log_startup_config,
    log_table_counts,
};
use tracing::subscriber::set_global_default;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("social_schema=info".parse()?))
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        );
    set_global_default(subscriber).context("failed to set tracing subscriber")?;

    let s = settings();
    log_startup_config(s);

    log_db_status("initializing SQLite connection pool...");
    let pool = establish_pool(&s.database)?;
    let mut conn = pool.get().context("failed to get initial connection")?;

    match run_migrations(&mut conn) {
        Ok(applied) => log_migrations_applied(applied),
        Err(e) => {
            log_db_error(&format!("migration failed: {e}"));
            return Err(e.into());
        }
    }
    log_db_ready();

    log_table_counts(&table_counts(&mut conn)?);

    Ok(())
}
