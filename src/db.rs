use crate::error::{SchemaError, SchemaResult};
use crate::schema::{comments, followers, medias, posts, users};
use crate::settings::Database;
use chrono::Utc;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::{debug, info};

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(Debug, Clone, Copy)]
struct ConnectionOptions {
    busy_timeout_ms: u32,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        configure_connection(conn, self.busy_timeout_ms).map_err(diesel::r2d2::Error::QueryError)
    }
}

pub fn establish_pool(database: &Database) -> SchemaResult<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(&database.url);
    let pool = Pool::builder()
        .max_size(database.pool_size)
        .connection_customizer(Box::new(ConnectionOptions {
            busy_timeout_ms: database.busy_timeout_ms,
        }))
        .build(manager)?;
    info!(url = %database.url, size = database.pool_size, "connection pool ready");
    Ok(pool)
}

/// Foreign keys are off by default in SQLite and must be enabled per connection.
pub fn configure_connection(conn: &mut SqliteConnection, busy_timeout_ms: u32) -> QueryResult<()> {
    conn.batch_execute(&format!("PRAGMA busy_timeout = {busy_timeout_ms};"))?;
    conn.batch_execute("PRAGMA journal_mode = WAL;")?;
    conn.batch_execute("PRAGMA synchronous = NORMAL;")?;
    conn.batch_execute("PRAGMA foreign_keys = ON;")?;
    Ok(())
}

pub fn run_migrations(conn: &mut SqliteConnection) -> SchemaResult<usize> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| SchemaError::Migration(e.to_string()))?;
    for version in &applied {
        debug!(%version, "applied migration");
    }
    Ok(applied.len())
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub users: i64,
    pub followers: i64,
    pub posts: i64,
    pub medias: i64,
    pub comments: i64,
}

pub fn table_counts(conn: &mut SqliteConnection) -> SchemaResult<TableCounts> {
    Ok(TableCounts {
        users: users::table.count().get_result(conn)?,
        followers: followers::table.count().get_result(conn)?,
        posts: posts::table.count().get_result(conn)?,
        medias: medias::table.count().get_result(conn)?,
        comments: comments::table.count().get_result(conn)?,
    })
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_migrations_create_empty_tables() {
        let mut conn = establish_test_connection();
        assert_eq!(table_counts(&mut conn).unwrap(), TableCounts::default());
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let mut conn = establish_test_connection();
        assert_eq!(run_migrations(&mut conn).unwrap(), 0);
    }

    #[derive(QueryableByName)]
    struct ForeignKeysPragma {
        #[diesel(sql_type = diesel::sql_types::Integer)]
        foreign_keys: i32,
    }

    #[test]
    fn test_configured_connection_has_foreign_keys_on() {
        let mut conn = establish_test_connection();
        let pragma: ForeignKeysPragma = diesel::sql_query("PRAGMA foreign_keys")
            .get_result(&mut conn)
            .unwrap();
        assert_eq!(pragma.foreign_keys, 1);
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let mut conn = establish_test_connection();
        let result = conn.batch_execute(
            "INSERT INTO posts (user_id, created_at, update_at) VALUES (999, 0, 0);",
        );
        assert!(result.is_err());
    }
}
