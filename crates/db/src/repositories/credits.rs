use crate::models::DbCreditTransaction;
use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::PgExecutor;
use uuid::Uuid;

pub async fn create_transaction<'e, E>(
    executor: E,
    account_id: Uuid,
    amount: i64,
    kind: &str,
    now: DateTime<Utc>,
) -> Result<DbCreditTransaction>
where
    E: PgExecutor<'e>,
{
    let transaction = sqlx::query_as::<_, DbCreditTransaction>(
        r#"
        INSERT INTO credit_transactions (id, account_id, amount, kind, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, account_id, amount, kind, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(account_id)
    .bind(amount)
    .bind(kind)
    .bind(now)
    .fetch_one(executor)
    .await?;

    Ok(transaction)
}

pub async fn get_transactions_by_account<'e, E>(
    executor: E,
    account_id: Uuid,
) -> Result<Vec<DbCreditTransaction>>
where
    E: PgExecutor<'e>,
{
    let transactions = sqlx::query_as::<_, DbCreditTransaction>(
        r#"
        SELECT id, account_id, amount, kind, created_at
        FROM credit_transactions
        WHERE account_id = $1
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(account_id)
    .fetch_all(executor)
    .await?;

    Ok(transactions)
}
