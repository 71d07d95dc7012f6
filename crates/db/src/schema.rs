use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_accounts_role_verification ON accounts(role, verification_status)",
    "CREATE INDEX IF NOT EXISTS idx_accounts_specialty ON accounts(LOWER(TRIM(specialty)))",
    "CREATE INDEX IF NOT EXISTS idx_availabilities_provider_id ON availabilities(provider_id)",
    "CREATE INDEX IF NOT EXISTS idx_appointments_provider_status_start ON appointments(provider_id, status, start_time)",
    "CREATE INDEX IF NOT EXISTS idx_appointments_requester_id ON appointments(requester_id)",
    "CREATE INDEX IF NOT EXISTS idx_credit_transactions_account_id ON credit_transactions(account_id)",
];

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Create accounts table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name VARCHAR(255) NOT NULL,
            role VARCHAR(32) NOT NULL DEFAULT 'UNASSIGNED',
            credits BIGINT NOT NULL DEFAULT 0,
            specialty VARCHAR(255) NULL,
            experience_years INTEGER NULL,
            credential_url TEXT NULL,
            description TEXT NULL,
            verification_status VARCHAR(32) NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT non_negative_credits CHECK (credits >= 0)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create availabilities table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS availabilities (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            provider_id UUID NOT NULL REFERENCES accounts(id),
            start_time TIME NOT NULL,
            end_time TIME NOT NULL,
            status VARCHAR(32) NOT NULL DEFAULT 'AVAILABLE',
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_window CHECK (end_time > start_time)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create appointments table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS appointments (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            provider_id UUID NOT NULL REFERENCES accounts(id),
            requester_id UUID NOT NULL REFERENCES accounts(id),
            start_time TIMESTAMP WITH TIME ZONE NOT NULL,
            end_time TIMESTAMP WITH TIME ZONE NOT NULL,
            status VARCHAR(32) NOT NULL DEFAULT 'SCHEDULED',
            requester_note TEXT NULL,
            clinical_note TEXT NULL,
            session_id VARCHAR(255) NOT NULL,
            session_token TEXT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_time_range CHECK (end_time > start_time)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create credit_transactions table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS credit_transactions (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            account_id UUID NOT NULL REFERENCES accounts(id),
            amount BIGINT NOT NULL,
            kind VARCHAR(32) NOT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    for statement in INDEXES {
        sqlx::query(*statement).execute(pool).await?;
    }

    info!("Database schema initialized successfully.");
    Ok(())
}
