//! Grouped sums for reports.
//!
//! Both queries cover non-deleted transactions of one family whose date
//! lies in `[start, end]` inclusive. Sums are over `amount_base`, so every
//! total is in the family's base currency. Percentages, averages and
//! savings are derived by `famledger_core::reports`.

use famledger_core::ledger::TransactionType;
use famledger_core::period::DateRange;
use famledger_core::reports::{CategoryTotal, TypeTotal};
use famledger_shared::types::{CategoryId, FamilyId};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult, QueryFilter, QueryOrder,
    QuerySelect, Select,
};
use uuid::Uuid;

use crate::entities::{sea_orm_active_enums, transactions};

#[derive(Debug, FromQueryResult)]
struct CategorySumRow {
    category_id: Uuid,
    total: Option<Decimal>,
    count: i64,
}

#[derive(Debug, FromQueryResult)]
struct TypeSumRow {
    transaction_type: sea_orm_active_enums::TransactionType,
    total: Option<Decimal>,
    count: i64,
}

/// Aggregation repository.
#[derive(Debug, Clone)]
pub struct AggregationRepository {
    db: DatabaseConnection,
}

impl AggregationRepository {
    /// Creates a new aggregation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Sum and count per category for one transaction type.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn summary_by_category(
        &self,
        family_id: FamilyId,
        transaction_type: TransactionType,
        range: DateRange,
    ) -> Result<Vec<CategoryTotal>, DbErr> {
        let transaction_type: sea_orm_active_enums::TransactionType = transaction_type.into();
        let rows = in_range(family_id, range)
            .select_only()
            .column(transactions::Column::CategoryId)
            .column_as(transactions::Column::AmountBase.sum(), "total")
            .column_as(transactions::Column::Id.count(), "count")
            .filter(transactions::Column::TransactionType.eq(transaction_type))
            .group_by(transactions::Column::CategoryId)
            .order_by_asc(transactions::Column::CategoryId)
            .into_model::<CategorySumRow>()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| CategoryTotal {
                category_id: CategoryId::from_uuid(r.category_id),
                total: r.total.unwrap_or_default(),
                count: r.count,
            })
            .collect())
    }

    /// Sum and count per transaction type.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn summary_by_type(
        &self,
        family_id: FamilyId,
        range: DateRange,
    ) -> Result<Vec<TypeTotal>, DbErr> {
        let rows = in_range(family_id, range)
            .select_only()
            .column(transactions::Column::TransactionType)
            .column_as(transactions::Column::AmountBase.sum(), "total")
            .column_as(transactions::Column::Id.count(), "count")
            .group_by(transactions::Column::TransactionType)
            .into_model::<TypeSumRow>()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| TypeTotal {
                transaction_type: r.transaction_type.into(),
                total: r.total.unwrap_or_default(),
                count: r.count,
            })
            .collect())
    }
}

fn in_range(family_id: FamilyId, range: DateRange) -> Select<transactions::Entity> {
    transactions::Entity::find()
        .filter(transactions::Column::FamilyId.eq(family_id.into_inner()))
        .filter(transactions::Column::DeletedAt.is_null())
        .filter(transactions::Column::TransactionDate.between(range.start, range.end))
}
