use weekrev_common::types::{ReportForm, ReviewMethod};

use crate::generator::GenerationRequest;

/// 空字段占位符
fn placeholder(locale: &str) -> &'static str {
    if locale == "zh-CN" {
        "无"
    } else {
        "None"
    }
}

fn text_or_placeholder(text: &str, locale: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        placeholder(locale).to_string()
    } else {
        trimmed.to_string()
    }
}

/// 单元格内容不能破坏表格结构
fn cell(text: &str, locale: &str) -> String {
    text_or_placeholder(text, locale).replace('|', "\\|").replace('\n', " ")
}

/// 把结构化表单渲染成 Markdown 段落与表格。
///
/// 既作为 LLM prompt 的上下文，也直接用作报告的数据部分。
/// 空数组渲染为占位符而不是空表格。
pub fn format_report_form(form: &ReportForm, locale: &str) -> String {
    let zh = locale == "zh-CN";
    let mut out = String::new();

    out.push_str(if zh { "### 上周工作计划\n\n" } else { "### Last Week Plan\n\n" });
    if form.last_week_plan.is_empty() {
        out.push_str(placeholder(locale));
        out.push('\n');
    } else {
        out.push_str(if zh {
            "| 任务 | 预期结果 | 完成情况 |\n|------|----------|----------|\n"
        } else {
            "| Task | Expected Result | Completion |\n|------|-----------------|------------|\n"
        });
        for item in &form.last_week_plan {
            out.push_str(&format!(
                "| {} | {} | {} |\n",
                cell(&item.task, locale),
                cell(&item.expected_result, locale),
                cell(&item.completion, locale),
            ));
        }
    }

    out.push_str(if zh { "\n### 每日行动记录\n\n" } else { "\n### Daily Actions\n\n" });
    if form.last_week_actions.is_empty() {
        out.push_str(placeholder(locale));
        out.push('\n');
    } else {
        out.push_str(if zh {
            "| 日期 | 上午行动 | 上午结果 | 晚上行动 | 晚上结果 |\n|------|----------|----------|----------|----------|\n"
        } else {
            "| Day | Morning Action | Morning Result | Evening Action | Evening Result |\n|-----|----------------|----------------|----------------|----------------|\n"
        });
        for action in &form.last_week_actions {
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                cell(&action.day, locale),
                cell(&action.morning_action, locale),
                cell(&action.morning_result, locale),
                cell(&action.evening_action, locale),
                cell(&action.evening_result, locale),
            ));
        }
    }

    out.push_str(if zh { "\n### 下周工作计划\n\n" } else { "\n### Next Week Plan\n\n" });
    if form.week_plan.is_empty() {
        out.push_str(placeholder(locale));
        out.push('\n');
    } else {
        out.push_str(if zh {
            "| 任务 | 预期结果 |\n|------|----------|\n"
        } else {
            "| Task | Expected Result |\n|------|------------------|\n"
        });
        for item in &form.week_plan {
            out.push_str(&format!(
                "| {} | {} |\n",
                cell(&item.task, locale),
                cell(&item.expected_result, locale),
            ));
        }
    }

    out.push_str(if zh { "\n### 需协调事项\n\n" } else { "\n### Coordination Items\n\n" });
    out.push_str(&text_or_placeholder(&form.coordination_items, locale));
    out.push('\n');

    out.push_str(if zh { "\n### 其他事项\n\n" } else { "\n### Other Items\n\n" });
    out.push_str(&text_or_placeholder(&form.other_items, locale));
    out.push('\n');

    out
}

/// 构建周报草稿的生成请求。
pub fn build_report_request(
    user_name: &str,
    date_range: &str,
    review_method: ReviewMethod,
    form: &ReportForm,
    locale: &str,
) -> GenerationRequest {
    let zh = locale == "zh-CN";
    let method_label = match (review_method, zh) {
        (ReviewMethod::Offline, true) => "线下复盘",
        (ReviewMethod::Online, true) => "线上复盘",
        (ReviewMethod::Offline, false) => "offline review",
        (ReviewMethod::Online, false) => "online review",
    };

    let template = if zh { REPORT_PROMPT_ZH } else { REPORT_PROMPT_EN };
    let prompt = template
        .replace("{{USER_NAME}}", user_name)
        .replace("{{DATE_RANGE}}", date_range)
        .replace("{{REVIEW_METHOD}}", method_label)
        .replace("{{FORM_DATA}}", &format_report_form(form, locale));

    GenerationRequest {
        system: if zh { SYSTEM_ZH } else { SYSTEM_EN }.to_string(),
        prompt,
    }
}

/// 构建整合报告的生成请求：把一周内多份个人周报并成一份综合报告。
pub fn build_integration_request(
    reports: &[(String, String)],
    date_range: &str,
    locale: &str,
) -> GenerationRequest {
    let zh = locale == "zh-CN";
    let mut combined = String::new();
    for (user_name, body) in reports {
        if zh {
            combined.push_str(&format!("## {user_name} 的周报\n\n"));
        } else {
            combined.push_str(&format!("## Report from {user_name}\n\n"));
        }
        combined.push_str(body.trim());
        combined.push_str("\n\n---\n\n");
    }

    let template = if zh { INTEGRATION_PROMPT_ZH } else { INTEGRATION_PROMPT_EN };
    let prompt = template
        .replace("{{DATE_RANGE}}", date_range)
        .replace("{{REPORTS}}", &combined);

    GenerationRequest {
        system: if zh { SYSTEM_ZH } else { SYSTEM_EN }.to_string(),
        prompt,
    }
}

const SYSTEM_ZH: &str = "你是一位资深销售团队管理助手，擅长把复盘表单整理成结构清晰、重点突出的周报。";

const SYSTEM_EN: &str = "You are an experienced sales team assistant, skilled at turning review forms into clear, focused weekly reports.";

const REPORT_PROMPT_ZH: &str = r#"请根据以下复盘表单，为 {{USER_NAME}} 生成 {{DATE_RANGE}} 的销售周报（{{REVIEW_METHOD}}）。

表单数据：
{{FORM_DATA}}

要求（使用 Markdown 格式输出）：

## 【本周总结】
- 对照上周计划逐项说明完成情况与差距
- 提炼每日行动中的关键进展与问题

## 【下周计划】
- 按优先级列出下周任务与预期结果

## 【需要支持】
- 汇总需协调事项与其他事项，没有则写"无"

直接输出报告正文，不要添加额外说明。"#;

const REPORT_PROMPT_EN: &str = r#"Based on the review form below, write the weekly sales report for {{USER_NAME}} covering {{DATE_RANGE}} ({{REVIEW_METHOD}}).

Form data:
{{FORM_DATA}}

Requirements (output in Markdown):

## Summary
- Compare against last week's plan item by item
- Highlight key progress and problems from the daily actions

## Next Week
- List next week's tasks with expected results, by priority

## Support Needed
- Summarize coordination and other items; write "None" if empty

Output the report body directly without extra commentary."#;

const INTEGRATION_PROMPT_ZH: &str = r#"以下是 {{DATE_RANGE}} 团队成员各自的周报，请整合生成一份团队周报：

{{REPORTS}}

要求（使用 Markdown 格式输出）：

## 【团队概况】
- 成员数量与整体完成情况

## 【重点进展】
- 跨成员归并同类工作，突出共性进展与风险

## 【下周安排】
- 汇总各成员下周计划，标出需要协调的事项

直接输出报告正文，不要添加额外说明。"#;

const INTEGRATION_PROMPT_EN: &str = r#"Below are the individual weekly reports for {{DATE_RANGE}}. Merge them into one team report:

{{REPORTS}}

Requirements (output in Markdown):

## Team Overview
- Head count and overall completion

## Key Progress
- Merge similar work across members, highlight shared progress and risks

## Next Week
- Aggregate next-week plans, flag items needing coordination

Output the report body directly without extra commentary."#;

#[cfg(test)]
mod tests {
    use super::*;
    use weekrev_common::types::{DailyAction, PlanItem, WeekPlanItem};

    #[test]
    fn test_empty_sections_render_placeholder() {
        let form = ReportForm::default();
        let text = format_report_form(&form, "zh-CN");
        // 每个空段落都是占位符，而不是空表格
        assert_eq!(text.matches('无').count(), 5);
        assert!(!text.contains('|'));

        let text_en = format_report_form(&form, "en");
        assert_eq!(text_en.matches("None").count(), 5);
    }

    #[test]
    fn test_tables_render_rows() {
        let form = ReportForm {
            last_week_plan: vec![PlanItem {
                task: "拜访客户A".to_string(),
                expected_result: "签约".to_string(),
                completion: "已完成".to_string(),
            }],
            last_week_actions: vec![DailyAction {
                day: "周一".to_string(),
                morning_action: "电话跟进".to_string(),
                morning_result: "约定拜访".to_string(),
                evening_action: "整理资料".to_string(),
                evening_result: "完成".to_string(),
            }],
            week_plan: vec![WeekPlanItem {
                task: "推进合同".to_string(),
                expected_result: "用印".to_string(),
            }],
            coordination_items: "需要法务支持".to_string(),
            other_items: String::new(),
        };
        let text = format_report_form(&form, "zh-CN");
        assert!(text.contains("| 拜访客户A | 签约 | 已完成 |"));
        assert!(text.contains("| 周一 | 电话跟进 | 约定拜访 | 整理资料 | 完成 |"));
        assert!(text.contains("| 推进合同 | 用印 |"));
        assert!(text.contains("需要法务支持"));
        // 其他事项为空，单独渲染占位符
        assert!(text.contains("### 其他事项\n\n无"));
    }

    #[test]
    fn test_cell_content_cannot_break_table() {
        let form = ReportForm {
            last_week_plan: vec![PlanItem {
                task: "含|竖线\n和换行".to_string(),
                expected_result: String::new(),
                completion: String::new(),
            }],
            ..ReportForm::default()
        };
        let text = format_report_form(&form, "zh-CN");
        assert!(text.contains("含\\|竖线 和换行"));
    }

    #[test]
    fn test_report_request_substitutes_placeholders() {
        let req = build_report_request(
            "张三",
            "2025-01-06 ~ 2025-01-12",
            ReviewMethod::Online,
            &ReportForm::default(),
            "zh-CN",
        );
        assert!(req.prompt.contains("张三"));
        assert!(req.prompt.contains("2025-01-06 ~ 2025-01-12"));
        assert!(req.prompt.contains("线上复盘"));
        assert!(!req.prompt.contains("{{"));
        assert!(!req.system.is_empty());
    }

    #[test]
    fn test_integration_request_merges_reports() {
        let reports = vec![
            ("张三".to_string(), "A 的内容".to_string()),
            ("李四".to_string(), "B 的内容".to_string()),
        ];
        let req = build_integration_request(&reports, "2025-01-06 ~ 2025-01-12", "zh-CN");
        assert!(req.prompt.contains("## 张三 的周报"));
        assert!(req.prompt.contains("## 李四 的周报"));
        assert!(req.prompt.contains("A 的内容"));
        assert!(req.prompt.contains("B 的内容"));
        assert!(!req.prompt.contains("{{"));
    }
}
