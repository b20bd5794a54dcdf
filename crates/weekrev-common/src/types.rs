use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// 复盘方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReviewMethod {
    Offline,
    Online,
}

impl ReviewMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Online => "online",
        }
    }
}

impl std::str::FromStr for ReviewMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "offline" => Ok(Self::Offline),
            "online" => Ok(Self::Online),
            other => Err(format!("unknown review method: {other}")),
        }
    }
}

/// 上周计划条目
#[derive(Debug, Clone, Serialize, Deserialize, Default, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanItem {
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub expected_result: String,
    /// 完成情况描述
    #[serde(default)]
    pub completion: String,
}

/// 每日早晚行动（一周 7 条）
#[derive(Debug, Clone, Serialize, Deserialize, Default, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyAction {
    #[serde(default)]
    pub day: String,
    #[serde(default)]
    pub morning_action: String,
    #[serde(default)]
    pub morning_result: String,
    #[serde(default)]
    pub evening_action: String,
    #[serde(default)]
    pub evening_result: String,
}

/// 下周计划条目
#[derive(Debug, Clone, Serialize, Deserialize, Default, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeekPlanItem {
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub expected_result: String,
}

/// 周报表单内容（生成与保存共用的结构化字段）
#[derive(Debug, Clone, Serialize, Deserialize, Default, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportForm {
    #[serde(default)]
    pub last_week_plan: Vec<PlanItem>,
    #[serde(default)]
    pub last_week_actions: Vec<DailyAction>,
    #[serde(default)]
    pub week_plan: Vec<WeekPlanItem>,
    #[serde(default)]
    pub coordination_items: String,
    #[serde(default)]
    pub other_items: String,
}

/// 保存周报请求
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveReportRequest {
    /// [start, end]，`YYYY-MM-DD`
    pub date_range: Vec<String>,
    #[serde(default)]
    pub selected_user: Option<String>,
    #[serde(default)]
    pub selected_user_name: Option<String>,
    pub review_method: ReviewMethod,
    #[serde(flatten)]
    pub form: ReportForm,
    #[serde(default)]
    pub ai_report: String,
}

/// 用户行
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 周桶行（含冗余统计计数）
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct WeekRow {
    pub id: String,
    pub week_number: i32,
    pub year: i32,
    pub date_range_start: NaiveDate,
    pub date_range_end: NaiveDate,
    pub report_count: i32,
    pub locked_count: i32,
    pub unlocked_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 周报行
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ReviewReportRow {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub date_range_start: NaiveDate,
    pub date_range_end: NaiveDate,
    pub review_method: ReviewMethod,
    pub form: ReportForm,
    pub ai_report: String,
    pub is_locked: bool,
    pub week_id: String,
    pub week_number: i32,
    pub created_at: DateTime<Utc>,
}

/// AI 整合报告行
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct IntegrationReportRow {
    pub id: String,
    pub week_id: String,
    pub week_number: i32,
    pub date_range: String,
    pub user_names: String,
    pub report_content: String,
    pub file_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
