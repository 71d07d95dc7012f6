use crate::models::DbAccount;
use eyre::Result;
use sqlx::PgExecutor;
use uuid::Uuid;

const ACCOUNT_COLUMNS: &str = "id, name, role, credits, specialty, experience_years, \
     credential_url, description, verification_status, created_at";

/// Profile columns written together when an account becomes a provider.
#[derive(Debug, Clone, Copy)]
pub struct ProfileColumns<'a> {
    pub specialty: &'a str,
    pub experience_years: i32,
    pub credential_url: &'a str,
    pub description: &'a str,
    pub verification_status: &'a str,
}

pub async fn get_account_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<DbAccount>>
where
    E: PgExecutor<'e>,
{
    tracing::debug!("Getting account by id: {}", id);

    let account = sqlx::query_as::<_, DbAccount>(&format!(
        r#"
        SELECT {ACCOUNT_COLUMNS}
        FROM accounts
        WHERE id = $1
        "#
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(account)
}

/// Takes the row lock on an account and returns its cached balance.
pub async fn lock_account<'e, E>(executor: E, id: Uuid) -> Result<Option<i64>>
where
    E: PgExecutor<'e>,
{
    let credits = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT credits
        FROM accounts
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(credits)
}

pub async fn adjust_credits<'e, E>(executor: E, id: Uuid, delta: i64) -> Result<i64>
where
    E: PgExecutor<'e>,
{
    let credits = sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE accounts
        SET credits = credits + $2
        WHERE id = $1
        RETURNING credits
        "#,
    )
    .bind(id)
    .bind(delta)
    .fetch_one(executor)
    .await?;

    Ok(credits)
}

pub async fn update_role<'e, E>(
    executor: E,
    id: Uuid,
    role: &str,
    profile: Option<ProfileColumns<'_>>,
) -> Result<Option<DbAccount>>
where
    E: PgExecutor<'e>,
{
    let account = sqlx::query_as::<_, DbAccount>(&format!(
        r#"
        UPDATE accounts
        SET role = $2,
            specialty = $3,
            experience_years = $4,
            credential_url = $5,
            description = $6,
            verification_status = $7
        WHERE id = $1
        RETURNING {ACCOUNT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(role)
    .bind(profile.map(|p| p.specialty))
    .bind(profile.map(|p| p.experience_years))
    .bind(profile.map(|p| p.credential_url))
    .bind(profile.map(|p| p.description))
    .bind(profile.map(|p| p.verification_status))
    .fetch_optional(executor)
    .await?;

    Ok(account)
}

pub async fn set_verification_status<'e, E>(
    executor: E,
    id: Uuid,
    status: &str,
) -> Result<Option<DbAccount>>
where
    E: PgExecutor<'e>,
{
    let account = sqlx::query_as::<_, DbAccount>(&format!(
        r#"
        UPDATE accounts
        SET verification_status = $2
        WHERE id = $1 AND role = 'PROVIDER'
        RETURNING {ACCOUNT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(status)
    .fetch_optional(executor)
    .await?;

    Ok(account)
}

pub async fn get_providers_by_status<'e, E>(executor: E, status: &str) -> Result<Vec<DbAccount>>
where
    E: PgExecutor<'e>,
{
    let providers = sqlx::query_as::<_, DbAccount>(&format!(
        r#"
        SELECT {ACCOUNT_COLUMNS}
        FROM accounts
        WHERE role = 'PROVIDER' AND verification_status = $1
        ORDER BY created_at ASC
        "#
    ))
    .bind(status)
    .fetch_all(executor)
    .await?;

    Ok(providers)
}

pub async fn get_providers_by_specialty<'e, E>(
    executor: E,
    specialty: &str,
    status: &str,
) -> Result<Vec<DbAccount>>
where
    E: PgExecutor<'e>,
{
    let providers = sqlx::query_as::<_, DbAccount>(&format!(
        r#"
        SELECT {ACCOUNT_COLUMNS}
        FROM accounts
        WHERE role = 'PROVIDER'
          AND verification_status = $2
          AND LOWER(TRIM(specialty)) = LOWER(TRIM($1))
        ORDER BY name ASC
        "#
    ))
    .bind(specialty)
    .bind(status)
    .fetch_all(executor)
    .await?;

    Ok(providers)
}
