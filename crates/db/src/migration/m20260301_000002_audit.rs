//! Audit trail migration.
//!
//! Every insert or update on `transactions` writes an `audit_log` row
//! attributed to `app.current_user_id`. A write with no actor bound to the
//! database transaction raises and rolls back.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(AUDIT_LOG_SQL).await?;
        db.execute_unprepared(AUDIT_TRIGGER_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_AUDIT_SQL).await?;
        Ok(())
    }
}

const AUDIT_LOG_SQL: &str = r"
CREATE TABLE audit_log (
    id BIGSERIAL PRIMARY KEY,
    table_name VARCHAR(63) NOT NULL,
    record_id UUID NOT NULL,
    action VARCHAR(10) NOT NULL,
    actor_id UUID NOT NULL,
    changed_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    old_data JSONB,
    new_data JSONB,
    CONSTRAINT chk_audit_action CHECK (action IN ('INSERT', 'UPDATE', 'DELETE'))
);

CREATE INDEX idx_audit_log_record ON audit_log(table_name, record_id, changed_at);
";

const AUDIT_TRIGGER_SQL: &str = r"
-- ============================================================
-- FUNCTION: audit_transaction_change
-- Requires app.current_user_id (SET LOCAL) for every write.
-- A soft delete (deleted_at going from NULL to a value) is logged as DELETE.
-- ============================================================
CREATE OR REPLACE FUNCTION audit_transaction_change()
RETURNS TRIGGER AS $$
DECLARE
    actor TEXT := current_setting('app.current_user_id', true);
    audit_action TEXT;
BEGIN
    IF actor IS NULL OR actor = '' THEN
        RAISE EXCEPTION 'app.current_user_id is not set; refusing unattributed write to %', TG_TABLE_NAME;
    END IF;

    IF TG_OP = 'INSERT' THEN
        audit_action := 'INSERT';
    ELSIF OLD.deleted_at IS NULL AND NEW.deleted_at IS NOT NULL THEN
        audit_action := 'DELETE';
    ELSE
        audit_action := 'UPDATE';
    END IF;

    INSERT INTO audit_log (table_name, record_id, action, actor_id, old_data, new_data)
    VALUES (
        TG_TABLE_NAME,
        NEW.id,
        audit_action,
        actor::uuid,
        CASE WHEN TG_OP = 'UPDATE' THEN to_jsonb(OLD) END,
        to_jsonb(NEW)
    );

    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_transactions_audit
AFTER INSERT OR UPDATE ON transactions
FOR EACH ROW
EXECUTE FUNCTION audit_transaction_change();
";

const DROP_AUDIT_SQL: &str = r"
DROP TRIGGER IF EXISTS trg_transactions_audit ON transactions;
DROP FUNCTION IF EXISTS audit_transaction_change() CASCADE;
DROP TABLE IF EXISTS audit_log CASCADE;
";
