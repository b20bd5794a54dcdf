use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use weekrev_common::types::UserRow;

use crate::entities::review_report::{Column as RepCol, Entity as RepEntity};
use crate::entities::user::{self, Column as UserCol, Entity as UserEntity};
use crate::error::{Result, StorageError};
use crate::store::ReportStore;

fn model_to_user(m: user::Model) -> UserRow {
    UserRow {
        id: m.id,
        name: m.name,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    }
}

impl ReportStore {
    pub async fn create_user(&self, name: &str) -> Result<UserRow> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StorageError::Validation("name must not be empty".to_string()));
        }
        let existing = UserEntity::find()
            .filter(UserCol::Name.eq(name))
            .one(self.db())
            .await?;
        if existing.is_some() {
            return Err(StorageError::Conflict(format!("user '{name}' already exists")));
        }

        let now = Utc::now().fixed_offset();
        let am = user::ActiveModel {
            id: Set(weekrev_common::id::next_id()),
            name: Set(name.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let m = am.insert(self.db()).await?;
        tracing::info!(user_id = %m.id, name = %m.name, "Created user");
        Ok(model_to_user(m))
    }

    pub async fn list_users(&self) -> Result<Vec<UserRow>> {
        let rows = UserEntity::find()
            .order_by(UserCol::CreatedAt, Order::Asc)
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(model_to_user).collect())
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<UserRow>> {
        let m = UserEntity::find_by_id(id).one(self.db()).await?;
        Ok(m.map(model_to_user))
    }

    /// 删除用户并级联删除其全部周报，受影响的周在同一事务内重算统计。
    pub async fn delete_user(&self, id: &str) -> Result<()> {
        let txn = self.db().begin().await?;

        let user = UserEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| StorageError::NotFound {
                entity: "user",
                id: id.to_string(),
            })?;

        // 级联前先收集受影响的周与报告 id（删除后无从查起）
        let owned: Vec<(String, String)> = RepEntity::find()
            .filter(RepCol::UserId.eq(id))
            .select_only()
            .column(RepCol::Id)
            .column(RepCol::WeekId)
            .into_tuple()
            .all(&txn)
            .await?;

        RepEntity::delete_many()
            .filter(RepCol::UserId.eq(id))
            .exec(&txn)
            .await?;
        UserEntity::delete_by_id(user.id.clone()).exec(&txn).await?;

        let mut week_ids: Vec<&String> = owned.iter().map(|(_, w)| w).collect();
        week_ids.sort();
        week_ids.dedup();
        for week_id in week_ids {
            self.recompute_week_statistics(&txn, week_id).await?;
        }
        txn.commit().await?;

        for (report_id, _) in &owned {
            self.files.remove_report(report_id);
        }
        tracing::info!(user_id = %id, reports = owned.len(), "Deleted user and owned reports");
        Ok(())
    }
}
