use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use weekrev_common::types::WeekRow;
use weekrev_common::week;

use crate::entities::review_report::{Column as RepCol, Entity as RepEntity};
use crate::entities::week as week_entity;
use crate::entities::week::{Column as WeekCol, Entity as WeekEntity};
use crate::error::{Result, StorageError};
use crate::store::ReportStore;

pub(crate) fn model_to_week(m: week_entity::Model) -> Result<WeekRow> {
    Ok(WeekRow {
        date_range_start: week::parse_date(&m.date_range_start)?,
        date_range_end: week::parse_date(&m.date_range_end)?,
        id: m.id,
        week_number: m.week_number,
        year: m.year,
        report_count: m.report_count,
        locked_count: m.locked_count,
        unlocked_count: m.unlocked_count,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    })
}

impl ReportStore {
    /// 按 `(week_number, year)` 查找周桶，不存在则以推导的日期区间创建。
    ///
    /// 日期区间永远由周次推导（`week::date_range_of`），不可独立设置。
    pub(crate) async fn upsert_week<C: ConnectionTrait>(
        &self,
        conn: &C,
        week_number: i32,
    ) -> Result<week_entity::Model> {
        let year = week::year_of_week(week_number)?;
        if let Some(existing) = WeekEntity::find()
            .filter(WeekCol::WeekNumber.eq(week_number))
            .filter(WeekCol::Year.eq(year))
            .one(conn)
            .await?
        {
            return Ok(existing);
        }

        let (start, end) = week::date_range_of(week_number)?;
        let now = Utc::now().fixed_offset();
        let am = week_entity::ActiveModel {
            id: Set(weekrev_common::id::next_id()),
            week_number: Set(week_number),
            year: Set(year),
            date_range_start: Set(start.format("%Y-%m-%d").to_string()),
            date_range_end: Set(end.format("%Y-%m-%d").to_string()),
            report_count: Set(0),
            locked_count: Set(0),
            unlocked_count: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let m = am.insert(conn).await?;
        tracing::info!(week_id = %m.id, week_number, year, "Created week bucket");
        Ok(m)
    }

    /// 重算一个周桶的三个统计计数。
    ///
    /// 计数从 `review_reports` 实表行重新推导，幂等；这是三个计数唯一的
    /// 写入路径，任何插入/删除/锁定/解锁之后都必须在同一事务内调用。
    pub(crate) async fn recompute_week_statistics<C: ConnectionTrait>(
        &self,
        conn: &C,
        week_id: &str,
    ) -> Result<()> {
        let m = WeekEntity::find_by_id(week_id)
            .one(conn)
            .await?
            .ok_or_else(|| StorageError::NotFound {
                entity: "week",
                id: week_id.to_string(),
            })?;

        let total = RepEntity::find()
            .filter(RepCol::WeekId.eq(week_id))
            .count(conn)
            .await?;
        let locked = RepEntity::find()
            .filter(RepCol::WeekId.eq(week_id))
            .filter(RepCol::IsLocked.eq(true))
            .count(conn)
            .await?;
        let unlocked = total - locked;

        let mut am: week_entity::ActiveModel = m.into();
        am.report_count = Set(total as i32);
        am.locked_count = Set(locked as i32);
        am.unlocked_count = Set(unlocked as i32);
        am.updated_at = Set(Utc::now().fixed_offset());
        am.update(conn).await?;

        tracing::debug!(
            week_id = %week_id,
            report_count = total,
            locked_count = locked,
            "Recomputed week statistics"
        );
        Ok(())
    }

    /// 全部周桶，年份、周次倒序。
    pub async fn list_weeks(&self) -> Result<Vec<WeekRow>> {
        let rows = WeekEntity::find()
            .order_by(WeekCol::Year, Order::Desc)
            .order_by(WeekCol::WeekNumber, Order::Desc)
            .all(self.db())
            .await?;
        rows.into_iter().map(model_to_week).collect()
    }

    pub async fn get_week(&self, id: &str) -> Result<Option<WeekRow>> {
        let m = WeekEntity::find_by_id(id).one(self.db()).await?;
        m.map(model_to_week).transpose()
    }
}
