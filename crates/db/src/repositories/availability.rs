use crate::models::DbAvailability;
use chrono::{DateTime, NaiveTime, Utc};
use eyre::Result;
use sqlx::PgExecutor;
use uuid::Uuid;

pub async fn create_availability<'e, E>(
    executor: E,
    provider_id: Uuid,
    start_time: NaiveTime,
    end_time: NaiveTime,
    now: DateTime<Utc>,
) -> Result<DbAvailability>
where
    E: PgExecutor<'e>,
{
    let availability = sqlx::query_as::<_, DbAvailability>(
        r#"
        INSERT INTO availabilities (id, provider_id, start_time, end_time, status, created_at)
        VALUES ($1, $2, $3, $4, 'AVAILABLE', $5)
        RETURNING id, provider_id, start_time, end_time, status, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(provider_id)
    .bind(start_time)
    .bind(end_time)
    .bind(now)
    .fetch_one(executor)
    .await?;

    Ok(availability)
}

/// The provider's active window, if any. The newest one wins should several exist.
pub async fn get_available_by_provider<'e, E>(
    executor: E,
    provider_id: Uuid,
) -> Result<Option<DbAvailability>>
where
    E: PgExecutor<'e>,
{
    let availability = sqlx::query_as::<_, DbAvailability>(
        r#"
        SELECT id, provider_id, start_time, end_time, status, created_at
        FROM availabilities
        WHERE provider_id = $1 AND status = 'AVAILABLE'
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(provider_id)
    .fetch_optional(executor)
    .await?;

    Ok(availability)
}

pub async fn get_availabilities_by_provider<'e, E>(
    executor: E,
    provider_id: Uuid,
) -> Result<Vec<DbAvailability>>
where
    E: PgExecutor<'e>,
{
    let availabilities = sqlx::query_as::<_, DbAvailability>(
        r#"
        SELECT id, provider_id, start_time, end_time, status, created_at
        FROM availabilities
        WHERE provider_id = $1
        ORDER BY start_time ASC
        "#,
    )
    .bind(provider_id)
    .fetch_all(executor)
    .await?;

    Ok(availabilities)
}

pub async fn delete_availabilities_by_provider<'e, E>(executor: E, provider_id: Uuid) -> Result<u64>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        DELETE FROM availabilities
        WHERE provider_id = $1
        "#,
    )
    .bind(provider_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}
