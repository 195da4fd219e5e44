use crate::db::Database;
use crate::error::{CropwiseError, Result};
use crate::models::{
    Crop, EnvironmentSample, Recommendation, RecommendationRecord, Season, SoilType,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tracing::warn;

// Recommendation history queries

impl Database {
    pub fn save_recommendation(&self, record: &RecommendationRecord) -> Result<i64> {
        if record.user.trim().is_empty() {
            return Err(CropwiseError::MissingField("user".into()));
        }

        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO recommendation_records
                    (user, soil_type, temperature_c, rainfall_mm, season,
                     crop_name, fertilizer_advice, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    record.user,
                    record.sample.soil_type.as_str(),
                    record.sample.temperature_c,
                    record.sample.rainfall_mm,
                    record.sample.season.as_str(),
                    record.recommendation.crop_name,
                    record.recommendation.fertilizer_advice,
                    record.created_at.to_rfc3339(),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Most recent records for a user, newest first.
    pub fn recommendations_for_user(
        &self,
        user: &str,
        limit: usize,
    ) -> Result<Vec<RecommendationRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT * FROM recommendation_records
                WHERE user = ?1
                ORDER BY created_at DESC, id DESC
                LIMIT ?2
                "#,
            )?;

            let records = stmt
                .query_map(params![user, limit as i64], row_to_record)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(records)
        })
    }

    pub fn get_recommendation(&self, id: i64) -> Result<Option<RecommendationRecord>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM recommendation_records WHERE id = ?1",
                [id],
                row_to_record,
            )
            .optional()
            .map_err(Into::into)
        })
    }

    pub fn count_recommendations(&self, user: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM recommendation_records WHERE user = ?1",
                [user],
                |row| row.get(0),
            )?;
            Ok(count as usize)
        })
    }
}

fn row_to_record(row: &Row) -> rusqlite::Result<RecommendationRecord> {
    let soil_str: String = row.get("soil_type")?;
    let season_str: String = row.get("season")?;
    let crop_name: String = row.get("crop_name")?;
    let created_str: String = row.get("created_at")?;

    let soil_type = SoilType::from_str(&soil_str).unwrap_or_else(|| {
        warn!(value = %soil_str, "Unknown soil type in history, defaulting to Loamy");
        SoilType::default()
    });

    let season = Season::from_label(&season_str);

    let crop = Crop::from_label(&crop_name).unwrap_or_else(|| {
        warn!(value = %crop_name, "Unknown crop in history, treating as mixed cropping");
        Crop::MixedCropping
    });

    let created_at = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            warn!(
                value = %created_str,
                error = %e,
                "Failed to parse created_at, using current time"
            );
            Utc::now()
        });

    Ok(RecommendationRecord {
        id: Some(row.get("id")?),
        user: row.get("user")?,
        sample: EnvironmentSample {
            soil_type,
            temperature_c: row.get("temperature_c")?,
            rainfall_mm: row.get("rainfall_mm")?,
            season,
        },
        recommendation: Recommendation {
            crop,
            crop_name,
            fertilizer_advice: row.get("fertilizer_advice")?,
        },
        created_at,
    })
}
