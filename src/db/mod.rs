use sqlx::{postgres::PgPoolOptions, PgPool};
use crate::{
    config::Config,
    error::Result,
    models::*,
    services::gamification::BadgeStore,
};

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}


impl Database {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// ==================== USER QUERIES ====================
impl Database {
    pub async fn create_user(&self, username: &str) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (username) VALUES ($1)
             ON CONFLICT (username) DO UPDATE SET username = EXCLUDED.username
             RETURNING *",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn set_verified(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, User>(
            "UPDATE users SET is_verified = TRUE WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Writes `badges` and adds `points_delta` only if the stored badge text
    /// still equals `expected`. Returns whether the row was updated.
    pub async fn commit_badges_if_unchanged(
        &self,
        user_id: i64,
        expected: &str,
        badges: &str,
        points_delta: i64,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET badges = $1, points = points + $2
             WHERE id = $3 AND badges = $4",
        )
        .bind(badges)
        .bind(points_delta)
        .bind(user_id)
        .bind(expected)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[async_trait::async_trait]
impl BadgeStore for Database {
    async fn commit_badges(
        &self,
        user_id: i64,
        expected: &str,
        badges: &str,
        points_delta: i64,
    ) -> Result<bool> {
        self.commit_badges_if_unchanged(user_id, expected, badges, points_delta)
            .await
    }

    async fn load_badges(&self, user_id: i64) -> Result<Option<(String, i64)>> {
        let row = sqlx::query_as::<_, (String, i64)>(
            "SELECT badges, points FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

// ==================== PREDICTION QUERIES ====================
impl Database {
    pub async fn insert_prediction(
        &self,
        user_id: i64,
        data: &PredictionData,
        loan_status: &str,
    ) -> Result<PredictionRecord> {
        let record = sqlx::query_as::<_, PredictionRecord>(
            r#"
            INSERT INTO predictions
                (user_id, cibil_score, loan_amount, income_annum,
                 residential_assets_value, commercial_assets_value, luxury_assets_value,
                 loan_status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(data.cibil_score)
        .bind(data.loan_amount)
        .bind(data.income_annum)
        .bind(data.residential_assets_value)
        .bind(data.commercial_assets_value)
        .bind(data.luxury_assets_value)
        .bind(loan_status)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    pub async fn list_predictions(&self, user_id: i64) -> Result<Vec<PredictionRecord>> {
        let rows = sqlx::query_as::<_, PredictionRecord>(
            "SELECT * FROM predictions WHERE user_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn latest_prediction(&self, user_id: i64) -> Result<Option<PredictionRecord>> {
        let row = sqlx::query_as::<_, PredictionRecord>(
            "SELECT * FROM predictions WHERE user_id = $1
             ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
