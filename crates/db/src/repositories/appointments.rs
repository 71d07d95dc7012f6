use crate::models::DbAppointment;
use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::PgExecutor;
use uuid::Uuid;

const APPOINTMENT_COLUMNS: &str = "id, provider_id, requester_id, start_time, end_time, status, \
     requester_note, clinical_note, session_id, session_token, created_at, updated_at";

#[allow(clippy::too_many_arguments)]
pub async fn create_appointment<'e, E>(
    executor: E,
    provider_id: Uuid,
    requester_id: Uuid,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    requester_note: Option<&str>,
    session_id: &str,
    now: DateTime<Utc>,
) -> Result<DbAppointment>
where
    E: PgExecutor<'e>,
{
    let appointment = sqlx::query_as::<_, DbAppointment>(&format!(
        r#"
        INSERT INTO appointments (
            id, provider_id, requester_id, start_time, end_time, status,
            requester_note, session_id, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, 'SCHEDULED', $6, $7, $8, $8)
        RETURNING {APPOINTMENT_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(provider_id)
    .bind(requester_id)
    .bind(start_time)
    .bind(end_time)
    .bind(requester_note)
    .bind(session_id)
    .bind(now)
    .fetch_one(executor)
    .await?;

    Ok(appointment)
}

pub async fn get_appointment_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<DbAppointment>>
where
    E: PgExecutor<'e>,
{
    let appointment = sqlx::query_as::<_, DbAppointment>(&format!(
        r#"
        SELECT {APPOINTMENT_COLUMNS}
        FROM appointments
        WHERE id = $1
        "#
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(appointment)
}

pub async fn lock_appointment<'e, E>(executor: E, id: Uuid) -> Result<Option<DbAppointment>>
where
    E: PgExecutor<'e>,
{
    let appointment = sqlx::query_as::<_, DbAppointment>(&format!(
        r#"
        SELECT {APPOINTMENT_COLUMNS}
        FROM appointments
        WHERE id = $1
        FOR UPDATE
        "#
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(appointment)
}

/// First scheduled appointment of the provider sharing an instant with `[start, end)`.
pub async fn find_overlapping<'e, E>(
    executor: E,
    provider_id: Uuid,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
) -> Result<Option<DbAppointment>>
where
    E: PgExecutor<'e>,
{
    let appointment = sqlx::query_as::<_, DbAppointment>(&format!(
        r#"
        SELECT {APPOINTMENT_COLUMNS}
        FROM appointments
        WHERE provider_id = $1
          AND status = 'SCHEDULED'
          AND NOT (end_time <= $2 OR $3 <= start_time)
        ORDER BY start_time ASC
        LIMIT 1
        "#
    ))
    .bind(provider_id)
    .bind(start_time)
    .bind(end_time)
    .fetch_optional(executor)
    .await?;

    Ok(appointment)
}

pub async fn get_scheduled_before<'e, E>(
    executor: E,
    provider_id: Uuid,
    before_or_at: DateTime<Utc>,
) -> Result<Vec<DbAppointment>>
where
    E: PgExecutor<'e>,
{
    let appointments = sqlx::query_as::<_, DbAppointment>(&format!(
        r#"
        SELECT {APPOINTMENT_COLUMNS}
        FROM appointments
        WHERE provider_id = $1
          AND status = 'SCHEDULED'
          AND start_time <= $2
        ORDER BY start_time ASC
        "#
    ))
    .bind(provider_id)
    .bind(before_or_at)
    .fetch_all(executor)
    .await?;

    Ok(appointments)
}

pub async fn get_appointments_by_provider<'e, E>(
    executor: E,
    provider_id: Uuid,
    status: Option<&str>,
) -> Result<Vec<DbAppointment>>
where
    E: PgExecutor<'e>,
{
    let appointments = sqlx::query_as::<_, DbAppointment>(&format!(
        r#"
        SELECT {APPOINTMENT_COLUMNS}
        FROM appointments
        WHERE provider_id = $1
          AND ($2::VARCHAR IS NULL OR status = $2)
        ORDER BY start_time ASC
        "#
    ))
    .bind(provider_id)
    .bind(status)
    .fetch_all(executor)
    .await?;

    Ok(appointments)
}

pub async fn get_appointments_by_requester<'e, E>(
    executor: E,
    requester_id: Uuid,
) -> Result<Vec<DbAppointment>>
where
    E: PgExecutor<'e>,
{
    let appointments = sqlx::query_as::<_, DbAppointment>(&format!(
        r#"
        SELECT {APPOINTMENT_COLUMNS}
        FROM appointments
        WHERE requester_id = $1
        ORDER BY start_time ASC
        "#
    ))
    .bind(requester_id)
    .fetch_all(executor)
    .await?;

    Ok(appointments)
}

pub async fn update_status<'e, E>(
    executor: E,
    id: Uuid,
    status: &str,
    now: DateTime<Utc>,
) -> Result<Option<DbAppointment>>
where
    E: PgExecutor<'e>,
{
    let appointment = sqlx::query_as::<_, DbAppointment>(&format!(
        r#"
        UPDATE appointments
        SET status = $2, updated_at = $3
        WHERE id = $1
        RETURNING {APPOINTMENT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(status)
    .bind(now)
    .fetch_optional(executor)
    .await?;

    Ok(appointment)
}

pub async fn update_clinical_note<'e, E>(
    executor: E,
    id: Uuid,
    notes: &str,
    now: DateTime<Utc>,
) -> Result<Option<DbAppointment>>
where
    E: PgExecutor<'e>,
{
    let appointment = sqlx::query_as::<_, DbAppointment>(&format!(
        r#"
        UPDATE appointments
        SET clinical_note = $2, updated_at = $3
        WHERE id = $1
        RETURNING {APPOINTMENT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(notes)
    .bind(now)
    .fetch_optional(executor)
    .await?;

    Ok(appointment)
}

pub async fn update_session_token<'e, E>(
    executor: E,
    id: Uuid,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<DbAppointment>>
where
    E: PgExecutor<'e>,
{
    let appointment = sqlx::query_as::<_, DbAppointment>(&format!(
        r#"
        UPDATE appointments
        SET session_token = $2, updated_at = $3
        WHERE id = $1
        RETURNING {APPOINTMENT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(token)
    .bind(now)
    .fetch_optional(executor)
    .await?;

    Ok(appointment)
}
