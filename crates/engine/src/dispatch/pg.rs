use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use sentinel_common::{ActuatorCommand, AlertMessage, Signal};

use super::sink::{AlertStore, CommandSink, DispatchError, SignalSink};

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
}

pub struct PgSignalStore {
    pool: PgPool,
}

impl PgSignalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SignalSink for PgSignalStore {
    async fn save_signal(&self, signal: &Signal) -> Result<(), DispatchError> {
        sqlx::query(
            r#"INSERT INTO signals
               (sentinel_config_id, organization_id, user_id, device_eui, level,
                subject, message, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7,
                       to_timestamp($8::double precision / 1000))"#,
        )
        .bind(signal.config_id)
        .bind(signal.organization_id)
        .bind(&signal.user_id)
        .bind(&signal.device_eui)
        .bind(signal.level)
        .bind(&signal.subject)
        .bind(&signal.message)
        .bind(signal.created_at_ms)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

pub struct PgAlertStore {
    pool: PgPool,
}

impl PgAlertStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlertStore for PgAlertStore {
    async fn save_alert(&self, alert: &AlertMessage) -> Result<(), DispatchError> {
        sqlx::query(
            r#"INSERT INTO alerts (alert_type, device_eui, user_id, message, created_at)
               VALUES ($1, $2, $3, $4, to_timestamp($5::double precision / 1000))"#,
        )
        .bind(&alert.alert_type)
        .bind(&alert.device_eui)
        .bind(&alert.user_id)
        .bind(&alert.message)
        .bind(alert.created_at_ms)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

pub struct PgCommandStore {
    pool: PgPool,
}

impl PgCommandStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommandSink for PgCommandStore {
    async fn put_command(&self, command: &ActuatorCommand) -> Result<(), DispatchError> {
        sqlx::query(
            r#"INSERT INTO device_commands (device_eui, kind, payload, created_at)
               VALUES ($1, $2, $3, to_timestamp($4::double precision / 1000))"#,
        )
        .bind(&command.target_eui)
        .bind(&command.kind)
        .bind(&command.payload)
        .bind(command.created_at_ms)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
