use anyhow::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, RuntimeErr, Statement};
use std::path::{Path, PathBuf};
use tokio::fs;

pub type OrmConn = DatabaseConnection;

/// Create a SeaORM connection.
pub async fn create_orm_conn(database_url: &str) -> Result<DatabaseConnection> {
    let conn = Database::connect(database_url).await?;
    Ok(conn)
}

/// Minimal migration runner that executes SQL files in `migrations/` in filename order.
pub async fn run_migrations(conn: &DatabaseConnection) -> Result<()> {
    run_migrations_from(conn, Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")).await
}

pub async fn run_migrations_from(conn: &DatabaseConnection, dir: impl AsRef<Path>) -> Result<()> {
    let mut entries = fs::read_dir(dir.as_ref()).await?;
    let mut files: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "sql") {
            files.push(path);
        }
    }
    files.sort();

    let backend = conn.get_database_backend();
    for file in files {
        let sql = fs::read_to_string(&file).await?;
        // Postgres prepared statements cannot contain multiple commands,
        // so split the migration file and run each statement individually.
        for stmt in sql.split(';') {
            let stmt = stmt.trim();
            if stmt.is_empty() {
                continue;
            }
            let statement = format!("{stmt};");
            conn.execute(Statement::from_string(backend, statement))
                .await?;
        }
        tracing::debug!(file = %file.display(), "migration applied");
    }

    Ok(())
}

/// Bound how long a transaction waits on row locks before Postgres aborts it.
pub async fn set_lock_timeout<C: ConnectionTrait>(conn: &C, millis: u64) -> Result<(), DbErr> {
    if millis == 0 {
        return Ok(());
    }
    conn.execute(Statement::from_string(
        conn.get_database_backend(),
        format!("SET LOCAL lock_timeout = '{millis}ms'"),
    ))
    .await?;
    Ok(())
}

/// SQLSTATEs for serialization failure, deadlock and lock timeout.
const TRANSIENT_SQLSTATES: [&str; 3] = ["40001", "40P01", "55P03"];

const UNIQUE_VIOLATION: &str = "23505";

/// Unique constraints whose violation means a lost race rather than bad input.
const RETRYABLE_UNIQUE_CONSTRAINTS: [&str; 1] = ["orders_order_code_key"];

/// Whether the error is a conflict that is safe to retry.
pub fn is_transient(err: &DbErr) -> bool {
    let runtime = match err {
        DbErr::Exec(runtime) | DbErr::Query(runtime) | DbErr::Conn(runtime) => runtime,
        _ => return false,
    };
    match runtime {
        RuntimeErr::SqlxError(sqlx::Error::Database(db_err)) => db_err
            .code()
            .is_some_and(|code| is_transient_state(code.as_ref(), db_err.constraint())),
        _ => false,
    }
}

fn is_transient_state(code: &str, constraint: Option<&str>) -> bool {
    if code == UNIQUE_VIOLATION {
        return constraint.is_some_and(|name| RETRYABLE_UNIQUE_CONSTRAINTS.contains(&name));
    }
    TRANSIENT_SQLSTATES.contains(&code)
}
