//! Migration: Create departments, jobs and hired_employees tables.
//!
//! Column order matches the upload schemas. The tables carry no primary or
//! unique keys: loading the same file twice appends duplicate rows.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE IF NOT EXISTS departments (
                    id BIGINT,
                    department TEXT
                );

                CREATE TABLE IF NOT EXISTS jobs (
                    id BIGINT,
                    job TEXT
                );

                CREATE TABLE IF NOT EXISTS hired_employees (
                    id BIGINT,
                    name TEXT,
                    datetime TIMESTAMP,
                    department_id BIGINT,
                    job_id BIGINT
                );

                -- Report filters and joins
                CREATE INDEX IF NOT EXISTS idx_hired_employees_datetime ON hired_employees(datetime);
                CREATE INDEX IF NOT EXISTS idx_hired_employees_department_id ON hired_employees(department_id);
                CREATE INDEX IF NOT EXISTS idx_departments_id ON departments(id);
                CREATE INDEX IF NOT EXISTS idx_jobs_id ON jobs(id);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DROP TABLE IF EXISTS hired_employees;
                DROP TABLE IF EXISTS jobs;
                DROP TABLE IF EXISTS departments;
                "#,
            )
            .await?;

        Ok(())
    }
}
