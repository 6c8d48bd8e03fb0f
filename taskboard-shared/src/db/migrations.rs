/// Migration runners for the three service databases
///
/// Each database has its own migration set, embedded at compile time:
///
/// - `migrations/users`: `users`
/// - `migrations/boards`: `boards`, `board_members`, `invitations`,
///   `board_deleted_outbox`
/// - `migrations/tasks`: `tasks`
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::db::migrations::{run_migrations, ServiceDatabase};
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::new(std::env::var("TASKS_DATABASE_URL")?)).await?;
/// run_migrations(&pool, ServiceDatabase::Tasks).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::migrate::{MigrateDatabase, Migrator};
use sqlx::postgres::PgPool;
use sqlx::Postgres;
use tracing::{debug, info, warn};

static USERS: Migrator = sqlx::migrate!("./migrations/users");
static BOARDS: Migrator = sqlx::migrate!("./migrations/boards");
static TASKS: Migrator = sqlx::migrate!("./migrations/tasks");

/// The database a pool points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceDatabase {
    Users,
    Boards,
    Tasks,
}

impl ServiceDatabase {
    pub fn name(&self) -> &'static str {
        match self {
            ServiceDatabase::Users => "users",
            ServiceDatabase::Boards => "boards",
            ServiceDatabase::Tasks => "tasks",
        }
    }

    /// The embedded migration set for this database
    pub fn migrator(&self) -> &'static Migrator {
        match self {
            ServiceDatabase::Users => &USERS,
            ServiceDatabase::Boards => &BOARDS,
            ServiceDatabase::Tasks => &TASKS,
        }
    }
}

/// Applies pending migrations for `database`
pub async fn run_migrations(
    pool: &PgPool,
    database: ServiceDatabase,
) -> Result<(), sqlx::migrate::MigrateError> {
    info!(database = database.name(), "Running migrations");

    database.migrator().run(pool).await.map_err(|e| {
        warn!(database = database.name(), error = %e, "Migration failed");
        e
    })?;

    info!(database = database.name(), "Migrations up to date");
    Ok(())
}

/// Number of successfully applied migrations
pub async fn applied_count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let table_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = 'public' AND table_name = '_sqlx_migrations'
        )",
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
        .fetch_one(pool)
        .await
}

/// Creates the database if it does not exist (development setups)
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if !Postgres::database_exists(database_url).await? {
        info!("Database does not exist, creating it");
        Postgres::create_database(database_url).await?;
    } else {
        debug!("Database already exists");
    }
    Ok(())
}
