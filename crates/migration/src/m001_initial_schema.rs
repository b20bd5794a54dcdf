use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m001_initial_schema"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 按依赖顺序建表
        manager.get_connection().execute_unprepared(UP_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(DOWN_SQL)
            .await?;
        Ok(())
    }
}

const UP_SQL: &str = "
PRAGMA foreign_keys=ON;

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS weeks (
    id TEXT PRIMARY KEY NOT NULL,
    week_number INTEGER NOT NULL,
    year INTEGER NOT NULL,
    date_range_start TEXT NOT NULL,
    date_range_end TEXT NOT NULL,
    report_count INTEGER NOT NULL DEFAULT 0,
    locked_count INTEGER NOT NULL DEFAULT 0,
    unlocked_count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (week_number, year)
);
CREATE INDEX IF NOT EXISTS idx_weeks_year_number ON weeks(year DESC, week_number DESC);

CREATE TABLE IF NOT EXISTS review_reports (
    id TEXT PRIMARY KEY NOT NULL,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    user_name TEXT NOT NULL,
    date_range_start TEXT NOT NULL,
    date_range_end TEXT NOT NULL,
    review_method TEXT NOT NULL DEFAULT 'offline',
    last_week_plan TEXT NOT NULL DEFAULT '[]',
    last_week_actions TEXT NOT NULL DEFAULT '[]',
    week_plan TEXT NOT NULL DEFAULT '[]',
    coordination_items TEXT NOT NULL DEFAULT '',
    other_items TEXT NOT NULL DEFAULT '',
    ai_report TEXT NOT NULL DEFAULT '',
    is_locked INTEGER NOT NULL DEFAULT 0,
    week_id TEXT NOT NULL REFERENCES weeks(id),
    week_number INTEGER NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_review_reports_week_id ON review_reports(week_id);
CREATE INDEX IF NOT EXISTS idx_review_reports_user_id ON review_reports(user_id);
CREATE INDEX IF NOT EXISTS idx_review_reports_created_at ON review_reports(created_at DESC);

CREATE TABLE IF NOT EXISTS integration_reports (
    id TEXT PRIMARY KEY NOT NULL,
    week_id TEXT NOT NULL REFERENCES weeks(id),
    week_number INTEGER NOT NULL,
    date_range TEXT NOT NULL,
    user_names TEXT NOT NULL DEFAULT '',
    report_content TEXT NOT NULL DEFAULT '',
    file_path TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_integration_reports_week_id ON integration_reports(week_id);
";

const DOWN_SQL: &str = "
DROP TABLE IF EXISTS integration_reports;
DROP TABLE IF EXISTS review_reports;
DROP TABLE IF EXISTS weeks;
DROP TABLE IF EXISTS users;
";
