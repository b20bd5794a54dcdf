use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, QueryFilter, QueryOrder,
    TransactionTrait,
};
use weekrev_common::types::{ReportForm, ReviewMethod, ReviewReportRow, SaveReportRequest};
use weekrev_common::week;

use crate::entities::review_report::{self, Column as RepCol, Entity as RepEntity};
use crate::entities::user::{Column as UserCol, Entity as UserEntity};
use crate::error::{Result, StorageError};
use crate::store::ReportStore;

pub(crate) fn model_to_report(m: review_report::Model) -> Result<ReviewReportRow> {
    let form = ReportForm {
        last_week_plan: serde_json::from_str(&m.last_week_plan)?,
        last_week_actions: serde_json::from_str(&m.last_week_actions)?,
        week_plan: serde_json::from_str(&m.week_plan)?,
        coordination_items: m.coordination_items,
        other_items: m.other_items,
    };
    Ok(ReviewReportRow {
        date_range_start: week::parse_date(&m.date_range_start)?,
        date_range_end: week::parse_date(&m.date_range_end)?,
        review_method: m.review_method.parse().unwrap_or(ReviewMethod::Offline),
        id: m.id,
        user_id: m.user_id,
        user_name: m.user_name,
        form,
        ai_report: m.ai_report,
        is_locked: m.is_locked,
        week_id: m.week_id,
        week_number: m.week_number,
        created_at: m.created_at.with_timezone(&Utc),
    })
}

impl ReportStore {
    /// 保存一份周报。
    ///
    /// 校验必填字段，由 `date_range_end` 推导周次，upsert 周桶，插入报告行，
    /// 并在同一事务内重算该周统计。提交后把 AI 报告正文镜像到磁盘。
    pub async fn save_report(&self, req: &SaveReportRequest) -> Result<ReviewReportRow> {
        if req.date_range.len() != 2 {
            return Err(StorageError::Validation(
                "dateRange must be [start, end]".to_string(),
            ));
        }
        let start = week::parse_date(&req.date_range[0])?;
        let end = week::parse_date(&req.date_range[1])?;
        if req.selected_user.is_none() && req.selected_user_name.is_none() {
            return Err(StorageError::Validation(
                "selectedUser or selectedUserName is required".to_string(),
            ));
        }

        let week_number = week::week_number_of(end)?;

        let txn = self.db().begin().await?;

        // 用户解析：优先按 id，缺省时按名称查找；user_name 冗余自用户表
        let user = if let Some(user_id) = &req.selected_user {
            UserEntity::find_by_id(user_id)
                .one(&txn)
                .await?
                .ok_or_else(|| StorageError::NotFound {
                    entity: "user",
                    id: user_id.clone(),
                })?
        } else {
            let name = req.selected_user_name.as_deref().unwrap_or_default();
            UserEntity::find()
                .filter(UserCol::Name.eq(name))
                .one(&txn)
                .await?
                .ok_or_else(|| StorageError::NotFound {
                    entity: "user",
                    id: name.to_string(),
                })?
        };

        let week_row = self.upsert_week(&txn, week_number).await?;

        let now = Utc::now().fixed_offset();
        let am = review_report::ActiveModel {
            id: Set(weekrev_common::id::next_id()),
            user_id: Set(user.id.clone()),
            user_name: Set(user.name.clone()),
            date_range_start: Set(start.format("%Y-%m-%d").to_string()),
            date_range_end: Set(end.format("%Y-%m-%d").to_string()),
            review_method: Set(req.review_method.as_str().to_string()),
            last_week_plan: Set(serde_json::to_string(&req.form.last_week_plan)?),
            last_week_actions: Set(serde_json::to_string(&req.form.last_week_actions)?),
            week_plan: Set(serde_json::to_string(&req.form.week_plan)?),
            coordination_items: Set(req.form.coordination_items.clone()),
            other_items: Set(req.form.other_items.clone()),
            ai_report: Set(req.ai_report.clone()),
            is_locked: Set(false),
            week_id: Set(week_row.id.clone()),
            week_number: Set(week_number),
            created_at: Set(now),
        };
        let m = am.insert(&txn).await?;

        self.recompute_week_statistics(&txn, &week_row.id).await?;
        txn.commit().await?;

        if let Err(e) = self.files.write_report(&m.id, &m.ai_report) {
            tracing::warn!(report_id = %m.id, error = %e, "Failed to mirror report body to disk");
        }

        tracing::info!(
            report_id = %m.id,
            week_id = %m.week_id,
            week_number,
            user = %m.user_name,
            "Saved review report"
        );
        model_to_report(m)
    }

    pub async fn get_report(&self, id: &str) -> Result<Option<ReviewReportRow>> {
        let m = RepEntity::find_by_id(id).one(self.db()).await?;
        m.map(model_to_report).transpose()
    }

    /// 某周的全部报告，创建时间倒序。
    pub async fn list_reports_by_week(&self, week_id: &str) -> Result<Vec<ReviewReportRow>> {
        let rows = RepEntity::find()
            .filter(RepCol::WeekId.eq(week_id))
            .order_by(RepCol::CreatedAt, Order::Desc)
            .all(self.db())
            .await?;
        rows.into_iter().map(model_to_report).collect()
    }

    /// 删除报告并重算所属周的统计（同一事务）。
    pub async fn delete_report(&self, id: &str) -> Result<()> {
        let txn = self.db().begin().await?;

        // 行删除后 week_id 即不可得，先取
        let m = RepEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| StorageError::NotFound {
                entity: "review_report",
                id: id.to_string(),
            })?;
        let week_id = m.week_id.clone();

        RepEntity::delete_by_id(id).exec(&txn).await?;
        self.recompute_week_statistics(&txn, &week_id).await?;
        txn.commit().await?;

        self.files.remove_report(id);
        tracing::info!(report_id = %id, week_id = %week_id, "Deleted review report");
        Ok(())
    }

    pub async fn lock_report(&self, id: &str) -> Result<ReviewReportRow> {
        self.set_locked(id, true).await
    }

    pub async fn unlock_report(&self, id: &str) -> Result<ReviewReportRow> {
        self.set_locked(id, false).await
    }

    async fn set_locked(&self, id: &str, locked: bool) -> Result<ReviewReportRow> {
        let txn = self.db().begin().await?;

        let m = RepEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| StorageError::NotFound {
                entity: "review_report",
                id: id.to_string(),
            })?;
        let week_id = m.week_id.clone();

        let mut am: review_report::ActiveModel = m.into();
        am.is_locked = Set(locked);
        let m = am.update(&txn).await?;

        self.recompute_week_statistics(&txn, &week_id).await?;
        txn.commit().await?;

        tracing::info!(report_id = %id, locked, "Updated report lock state");
        model_to_report(m)
    }

    /// 更新报告正文。锁定的报告内容已冻结，返回 [`StorageError::Locked`]。
    pub async fn update_report_content(&self, id: &str, ai_report: &str) -> Result<ReviewReportRow> {
        let m = RepEntity::find_by_id(id)
            .one(self.db())
            .await?
            .ok_or_else(|| StorageError::NotFound {
                entity: "review_report",
                id: id.to_string(),
            })?;
        if m.is_locked {
            return Err(StorageError::Locked { id: id.to_string() });
        }

        let mut am: review_report::ActiveModel = m.into();
        am.ai_report = Set(ai_report.to_string());
        let m = am.update(self.db()).await?;

        if let Err(e) = self.files.write_report(id, ai_report) {
            tracing::warn!(report_id = %id, error = %e, "Failed to mirror report body to disk");
        }
        model_to_report(m)
    }

    /// 导出用正文：镜像文件优先，数据库列兜底。
    pub async fn report_body(&self, id: &str) -> Result<(ReviewReportRow, String)> {
        let row = self
            .get_report(id)
            .await?
            .ok_or_else(|| StorageError::NotFound {
                entity: "review_report",
                id: id.to_string(),
            })?;
        let body = self
            .files
            .read_report(id)
            .unwrap_or_else(|| row.ai_report.clone());
        Ok((row, body))
    }
}
