use anyhow::{Context, anyhow};
use async_trait::async_trait;
use sqlx::{AnyPool, Row};

use crate::seat::model::{Event, Seat, SeatRef, SeatStatus};
use crate::seat::repository::SeatRepository;
use crate::time::next_id;

/// SQLx-backed implementation of SeatRepository.
/// Responsible only for persistence and row mapping.
pub struct SqlxSeatRepository {
    pool: AnyPool,
}

impl SqlxSeatRepository {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }
}

#[async_trait]
impl SeatRepository for SqlxSeatRepository {
    async fn fetch_event(&self, event_id: i64) -> anyhow::Result<Option<Event>> {
        let row = sqlx::query(
            r#"
SELECT id, name, date, seat_rows, seat_cols
FROM events
WHERE id = ?;
"#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(row_to_event(&r)?)),
            None => Ok(None),
        }
    }

    async fn fetch_seats(&self, event_id: i64, refs: &[SeatRef]) -> anyhow::Result<Vec<Seat>> {
        let mut out = Vec::with_capacity(refs.len());

        for r in refs {
            let row = sqlx::query(
                r#"
SELECT id, event_id, seat_row, seat_col, status, holder
FROM seats
WHERE event_id = ? AND seat_row = ? AND seat_col = ?;
"#,
            )
            .bind(event_id)
            .bind(&r.row)
            .bind(&r.col)
            .fetch_optional(&self.pool)
            .await?;

            if let Some(row) = row {
                out.push(row_to_seat(&row)?);
            }
        }

        Ok(out)
    }

    async fn fetch_all_seats(&self, event_id: i64) -> anyhow::Result<Vec<Seat>> {
        let rows = sqlx::query(
            r#"
SELECT id, event_id, seat_row, seat_col, status, holder
FROM seats
WHERE event_id = ?;
"#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            match row_to_seat(&r) {
                Ok(s) => out.push(s),
                Err(e) => {
                    // poison-row resilience: skip but don't fail the listing
                    tracing::warn!(error = %e, "skipping malformed seat row");
                }
            }
        }

        Ok(out)
    }

    async fn fetch_available(&self, event_id: i64) -> anyhow::Result<Vec<SeatRef>> {
        let rows = sqlx::query(
            r#"
SELECT seat_row, seat_col
FROM seats
WHERE event_id = ? AND status = 'AVAILABLE';
"#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| SeatRef::new(r.get::<String, _>("seat_row"), r.get::<String, _>("seat_col")))
            .collect())
    }

    async fn list_event_ids(&self) -> anyhow::Result<Vec<i64>> {
        let rows = sqlx::query(r#"SELECT id FROM events;"#)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|r| r.get::<i64, _>("id")).collect())
    }

    async fn insert_event_with_seats(&self, event: &Event) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
INSERT INTO events(id, name, date, seat_rows, seat_cols)
VALUES (?, ?, ?, ?, ?);
"#,
        )
        .bind(event.id)
        .bind(&event.name)
        .bind(&event.date)
        .bind(event.rows)
        .bind(event.cols)
        .execute(&mut *tx)
        .await
        .context("insert event")?;

        for row in 1..=event.rows {
            for col in 1..=event.cols {
                sqlx::query(
                    r#"
INSERT INTO seats(id, event_id, seat_row, seat_col, status, holder)
VALUES (?, ?, ?, ?, 'AVAILABLE', NULL);
"#,
                )
                .bind(next_id())
                .bind(event.id)
                .bind(row.to_string())
                .bind(col.to_string())
                .execute(&mut *tx)
                .await
                .context("insert seat")?;
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

/* =========================
Row mapping
========================= */

fn row_to_event(r: &sqlx::any::AnyRow) -> anyhow::Result<Event> {
    Ok(Event {
        id: r.get::<i64, _>("id"),
        name: r.get::<String, _>("name"),
        date: r.get::<String, _>("date"),
        rows: r.get::<i64, _>("seat_rows"),
        cols: r.get::<i64, _>("seat_cols"),
    })
}

fn row_to_seat(r: &sqlx::any::AnyRow) -> anyhow::Result<Seat> {
    let status_str: String = r.get("status");
    let status = SeatStatus::parse(&status_str)
        .ok_or_else(|| anyhow!("unknown seat status: {status_str}"))?;

    Ok(Seat {
        id: r.get::<i64, _>("id"),
        event_id: r.get::<i64, _>("event_id"),
        row: r.get::<String, _>("seat_row"),
        col: r.get::<String, _>("seat_col"),
        status,
        holder: r.try_get::<Option<String>, _>("holder").unwrap_or(None),
    })
}
