use sqlx::PgPool;

/// Pool-backed executor for read-side [`kanau::processor::Processor`] queries.
#[derive(Debug, Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}

/// An open PostgreSQL transaction.
///
/// Dropping it without calling `commit` rolls everything back.
pub struct TransactionProcessor {
    pub tx: sqlx::Transaction<'static, sqlx::Postgres>,
}
