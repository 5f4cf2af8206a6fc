use sqlx::AnyPool;

pub async fn migrate(pool: &AnyPool) -> anyhow::Result<()> {
    // Events
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS events (
  id BIGINT PRIMARY KEY,
  name TEXT NOT NULL,
  date TEXT NOT NULL,
  seat_rows BIGINT NOT NULL,
  seat_cols BIGINT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    // Seats
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS seats (
  id BIGINT PRIMARY KEY,
  event_id BIGINT NOT NULL,
  seat_row TEXT NOT NULL,
  seat_col TEXT NOT NULL,

  status TEXT NOT NULL,
  holder TEXT
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE UNIQUE INDEX IF NOT EXISTS idx_seats_event_row_col ON seats(event_id, seat_row, seat_col);"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_seats_event_status ON seats(event_id, status);"#)
        .execute(pool)
        .await?;

    Ok(())
}
