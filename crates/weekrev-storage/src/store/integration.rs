use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, QueryFilter, QueryOrder,
    TransactionTrait,
};
use weekrev_common::types::IntegrationReportRow;

use crate::entities::integration_report::{self, Column as IntCol, Entity as IntEntity};
use crate::error::{Result, StorageError};
use crate::store::ReportStore;

fn model_to_integration(m: integration_report::Model) -> IntegrationReportRow {
    IntegrationReportRow {
        id: m.id,
        week_id: m.week_id,
        week_number: m.week_number,
        date_range: m.date_range,
        user_names: m.user_names,
        report_content: m.report_content,
        file_path: m.file_path,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    }
}

/// 保存整合报告的入参。
pub struct NewIntegrationReport {
    pub week_id: String,
    pub week_number: i32,
    pub date_range: String,
    pub user_names: String,
    pub report_content: String,
}

impl ReportStore {
    /// 保存一周的 AI 整合报告。
    ///
    /// 界面的使用习惯是"删了重新生成"，因此每周只保留最新一份：
    /// 先删除该周的旧行再插入，事务提交后清理旧镜像文件。
    pub async fn save_integration_report(
        &self,
        input: &NewIntegrationReport,
    ) -> Result<IntegrationReportRow> {
        let report_id = weekrev_common::id::next_id();
        let file_path = self
            .files
            .write_integration(&report_id, &input.report_content)?;

        let txn = self.db().begin().await?;

        let stale: Vec<String> = IntEntity::find()
            .filter(IntCol::WeekId.eq(&input.week_id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect();
        if !stale.is_empty() {
            IntEntity::delete_many()
                .filter(IntCol::WeekId.eq(&input.week_id))
                .exec(&txn)
                .await?;
        }

        let now = Utc::now().fixed_offset();
        let am = integration_report::ActiveModel {
            id: Set(report_id.clone()),
            week_id: Set(input.week_id.clone()),
            week_number: Set(input.week_number),
            date_range: Set(input.date_range.clone()),
            user_names: Set(input.user_names.clone()),
            report_content: Set(input.report_content.clone()),
            file_path: Set(Some(file_path)),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let m = am.insert(&txn).await?;
        txn.commit().await?;

        for old_id in &stale {
            self.files.remove_integration(old_id);
        }

        tracing::info!(
            report_id = %m.id,
            week_id = %m.week_id,
            replaced = stale.len(),
            "Saved integration report"
        );
        Ok(model_to_integration(m))
    }

    pub async fn get_integration_report(&self, id: &str) -> Result<Option<IntegrationReportRow>> {
        let m = IntEntity::find_by_id(id).one(self.db()).await?;
        Ok(m.map(model_to_integration))
    }

    /// 某周最新一份整合报告。
    pub async fn latest_integration_for_week(
        &self,
        week_id: &str,
    ) -> Result<Option<IntegrationReportRow>> {
        let m = IntEntity::find()
            .filter(IntCol::WeekId.eq(week_id))
            .order_by(IntCol::CreatedAt, Order::Desc)
            .one(self.db())
            .await?;
        Ok(m.map(model_to_integration))
    }

    pub async fn delete_integration_report(&self, id: &str) -> Result<()> {
        let res = IntEntity::delete_by_id(id).exec(self.db()).await?;
        if res.rows_affected == 0 {
            return Err(StorageError::NotFound {
                entity: "integration_report",
                id: id.to_string(),
            });
        }
        self.files.remove_integration(id);
        Ok(())
    }

    /// 导出用正文：镜像文件优先，数据库列兜底。
    pub async fn integration_body(&self, id: &str) -> Result<(IntegrationReportRow, String)> {
        let row = self
            .get_integration_report(id)
            .await?
            .ok_or_else(|| StorageError::NotFound {
                entity: "integration_report",
                id: id.to_string(),
            })?;
        let body = self
            .files
            .read_integration(id)
            .unwrap_or_else(|| row.report_content.clone());
        Ok((row, body))
    }
}
