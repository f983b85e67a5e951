use ::duckdb::Connection;

struct Migration {
    version: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "0001_exchange_tables",
        sql: r#"
CREATE TABLE IF NOT EXISTS stocks (
    symbol TEXT PRIMARY KEY,
    stock_type TEXT NOT NULL,
    last_dividend DOUBLE,
    par_value DOUBLE NOT NULL CHECK (par_value > 0),
    fixed_dividend DOUBLE,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE SEQUENCE IF NOT EXISTS trade_seq START 1;

CREATE TABLE IF NOT EXISTS trades (
    id TEXT PRIMARY KEY,
    seq BIGINT NOT NULL DEFAULT nextval('trade_seq'),
    stock_symbol TEXT NOT NULL,
    ts TIMESTAMP NOT NULL,
    quantity BIGINT NOT NULL CHECK (quantity > 0),
    trade_type TEXT NOT NULL CHECK (trade_type IN ('buy', 'sell')),
    price DOUBLE NOT NULL CHECK (price > 0)
);

CREATE TABLE IF NOT EXISTS audit_log (
    transaction_id TEXT NOT NULL,
    operation TEXT NOT NULL,
    symbol TEXT,
    status TEXT NOT NULL,
    latency_ms BIGINT,
    timestamp TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    },
    Migration {
        version: "0002_indexes",
        sql: r#"
CREATE INDEX IF NOT EXISTS idx_trades_symbol_ts ON trades(stock_symbol, ts);
CREATE INDEX IF NOT EXISTS idx_audit_log_operation_ts ON audit_log(operation, timestamp);
"#,
    },
];

pub fn apply_migrations(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    )?;

    for migration in MIGRATIONS {
        let applied_count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM schema_migrations WHERE version = ?",
            [migration.version],
            |row| row.get(0),
        )?;

        if applied_count == 0 {
            tracing::debug!(version = migration.version, "applying migration");
            connection.execute_batch(migration.sql)?;
            connection.execute(
                "INSERT INTO schema_migrations (version) VALUES (?)",
                [migration.version],
            )?;
        }
    }

    Ok(())
}

pub fn applied_versions(connection: &Connection) -> Result<Vec<String>, ::duckdb::Error> {
    let mut statement =
        connection.prepare("SELECT version FROM schema_migrations ORDER BY version")?;
    let versions = statement
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(versions)
}
