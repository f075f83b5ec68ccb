use sqlx::SqlitePool;

use super::{StoreError, VisitRepository, is_safe_name};
use crate::models::{PARTITION_KEY, VisitEntity};

const COLUMNS: &str = "partition_key, row_key, user, information, local_ip, local_port, remote_ip, remote_port, creation_date";

/// Row store: one SQLite table keyed by `(partition_key, row_key)`.
#[derive(Debug, Clone)]
pub struct TableVisitStore {
    pool: SqlitePool,
    table: String,
}

impl TableVisitStore {
    /// Open the store on `table`, creating the table when it does not exist.
    pub async fn open(pool: SqlitePool, table: &str) -> Result<Self, StoreError> {
        if !is_safe_name(table) {
            return Err(StoreError::InvalidName(table.to_string()));
        }

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS "{table}" (
                partition_key TEXT NOT NULL,
                row_key TEXT NOT NULL,
                user TEXT NOT NULL,
                information TEXT NOT NULL,
                local_ip TEXT NOT NULL,
                local_port INTEGER NOT NULL,
                remote_ip TEXT NOT NULL,
                remote_port INTEGER NOT NULL,
                creation_date TEXT NOT NULL,
                PRIMARY KEY (partition_key, row_key)
            )
            "#
        ))
        .execute(&pool)
        .await?;

        Ok(Self {
            pool,
            table: table.to_string(),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl VisitRepository for TableVisitStore {
    async fn list(&self) -> Result<Vec<VisitEntity>, StoreError> {
        let mut entities: Vec<VisitEntity> = sqlx::query_as(&format!(
            r#"SELECT {COLUMNS} FROM "{}" WHERE partition_key = ?"#,
            self.table
        ))
        .bind(PARTITION_KEY)
        .fetch_all(&self.pool)
        .await?;

        // Stored dates carry a variable number of fractional digits, so their
        // text order is not reliable.
        entities.sort_by(|a, b| a.creation_date.cmp(&b.creation_date));
        Ok(entities)
    }

    async fn get(&self, id: &str) -> Result<Option<VisitEntity>, StoreError> {
        let entity = sqlx::query_as(&format!(
            r#"SELECT {COLUMNS} FROM "{}" WHERE partition_key = ? AND row_key = ?"#,
            self.table
        ))
        .bind(PARTITION_KEY)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entity)
    }

    async fn insert(&self, entity: &VisitEntity) -> Result<bool, StoreError> {
        let result = sqlx::query(&format!(
            r#"
            INSERT INTO "{}" ({COLUMNS})
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (partition_key, row_key) DO NOTHING
            "#,
            self.table
        ))
        .bind(&entity.partition_key)
        .bind(&entity.row_key)
        .bind(&entity.user)
        .bind(&entity.information)
        .bind(&entity.local_ip)
        .bind(entity.local_port)
        .bind(&entity.remote_ip)
        .bind(entity.remote_port)
        .bind(entity.creation_date)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn replace(&self, entity: &VisitEntity) -> Result<bool, StoreError> {
        let result = sqlx::query(&format!(
            r#"
            UPDATE "{}" SET
                user = ?,
                information = ?,
                local_ip = ?,
                local_port = ?,
                remote_ip = ?,
                remote_port = ?,
                creation_date = ?
            WHERE partition_key = ? AND row_key = ?
            "#,
            self.table
        ))
        .bind(&entity.user)
        .bind(&entity.information)
        .bind(&entity.local_ip)
        .bind(entity.local_port)
        .bind(&entity.remote_ip)
        .bind(entity.remote_port)
        .bind(entity.creation_date)
        .bind(&entity.partition_key)
        .bind(&entity.row_key)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(&format!(
            r#"DELETE FROM "{}" WHERE partition_key = ? AND row_key = ?"#,
            self.table
        ))
        .bind(PARTITION_KEY)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
