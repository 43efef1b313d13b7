//! Prompt Builder
//!
//! Builds the system + user prompt pair for one generation request: role and
//! audience tone, the output-JSON contract, tenant/period metadata, the raw
//! input serialized verbatim, and every AI placeholder's instruction grouped
//! by slide with its length/item constraints.
//!
//! Construction is fully deterministic: identical inputs produce
//! byte-identical prompts (no randomness, no timestamps), so prompts are
//! directly testable.

use std::fmt::Write as _;

use serde_json::{Map, Value, json};

use super::client::ChatPrompt;
use crate::extract::path;
use crate::template::{Audience, PlaceholderDefinition, PlaceholderType, TemplateDescriptor};
use crate::types::TenantInput;

/// Builds the chat prompt for a template's AI placeholders.
pub struct SlidePromptBuilder<'a> {
    template: &'a TemplateDescriptor,
    tenant: &'a TenantInput,
}

impl<'a> SlidePromptBuilder<'a> {
    pub fn new(template: &'a TemplateDescriptor, tenant: &'a TenantInput) -> Self {
        Self { template, tenant }
    }

    /// Build the system + user message pair.
    pub fn build(&self) -> ChatPrompt {
        ChatPrompt {
            system: self.build_system(),
            user: self.build_user(),
        }
    }

    fn build_system(&self) -> String {
        let tone = match self.template.audience {
            Audience::Management => {
                "面向管理层读者：使用简洁、面向业务影响的语言，突出趋势与结论，避免过深的技术细节。"
            }
            Audience::Technical => {
                "面向技术读者：使用准确的技术术语，给出具体指标、攻击手法与处置细节。"
            }
        };

        format!(
            "你是一名资深网络安全分析师，为托管安全服务（MSS）客户撰写安全运营报告的幻灯片内容。\n\
             {tone}\n\
             所有内容使用简体中文。数字必须与提供的原始数据一致，不得编造。\n\
             只返回一个 JSON 对象，不要输出任何解释文字或 Markdown 代码块。\n\
             JSON 结构必须为：{{\"slides\": [{{\"slide_key\": \"...\", \"placeholders\": {{\"TOKEN\": \"...\"}}}}]}}"
        )
    }

    fn build_user(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str("# 客户与周期\n\n");
        let raw = self.tenant.raw();
        let meta = [
            ("客户", "tenant.name"),
            ("周期开始", "period.start"),
            ("周期结束", "period.end"),
        ];
        for (label, source) in meta {
            let value = path::resolve(raw, source)
                .map(|v| crate::extract::format::stringify(v.as_ref()))
                .unwrap_or_default();
            let _ = writeln!(prompt, "- {}: {}", label, value);
        }
        prompt.push('\n');

        prompt.push_str("# 原始数据\n\n");
        // Map keys are ordered, so this serialization is deterministic.
        let _ = writeln!(
            prompt,
            "{}",
            serde_json::to_string_pretty(raw).unwrap_or_default()
        );
        prompt.push('\n');

        prompt.push_str("# 生成任务\n\n");
        prompt.push_str("为以下每个占位符生成内容：\n\n");
        for slide in &self.template.slides {
            let ai_placeholders: Vec<&PlaceholderDefinition> =
                slide.placeholders.iter().filter(|p| p.ai_generate).collect();
            if ai_placeholders.is_empty() {
                continue;
            }

            let _ = writeln!(
                prompt,
                "## Slide {}: {} ({})",
                slide.slide_no, slide.title, slide.slide_key
            );
            for ph in ai_placeholders {
                let _ = writeln!(
                    prompt,
                    "- {}: {}{}",
                    ph.token,
                    ph.ai_instruction.as_deref().unwrap_or_default(),
                    constraint_note(ph)
                );
            }
            prompt.push('\n');
        }

        prompt.push_str("# 输出格式示例\n\n");
        let _ = writeln!(prompt, "{}", self.example_output());

        prompt.trim_end().to_string()
    }

    /// Example of the required output shape, using the template's real slide
    /// keys and tokens.
    fn example_output(&self) -> String {
        let mut slides = Vec::new();
        for slide in &self.template.slides {
            let mut placeholders = Map::new();
            for ph in slide.placeholders.iter().filter(|p| p.ai_generate) {
                let example = match ph.placeholder_type {
                    PlaceholderType::BulletList => json!(["要点一", "要点二"]),
                    _ => json!("生成的内容"),
                };
                placeholders.insert(ph.token.clone(), example);
            }
            if !placeholders.is_empty() {
                slides.push(json!({
                    "slide_key": slide.slide_key,
                    "placeholders": placeholders,
                }));
            }
        }
        serde_json::to_string(&json!({ "slides": slides })).unwrap_or_default()
    }
}

/// Length/item constraints rendered after an instruction.
fn constraint_note(ph: &PlaceholderDefinition) -> String {
    let mut parts = Vec::new();
    if let Some(max_length) = ph.max_length {
        parts.push(format!("不超过{}字", max_length));
    }
    if let Some(max_items) = ph.max_items {
        parts.push(format!("最多{}条", max_items));
    }
    if let Some(max_chars) = ph.max_chars_per_item {
        parts.push(format!("每条不超过{}字", max_chars));
    }
    if ph.placeholder_type == PlaceholderType::BulletList {
        parts.push("以 JSON 字符串数组返回".to_string());
    }

    if parts.is_empty() {
        String::new()
    } else {
        format!("（{}）", parts.join("，"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template() -> TemplateDescriptor {
        TemplateDescriptor::from_json(
            r#"{
                "template_id": "t", "audience": "management",
                "slides": [
                    {
                        "slide_no": 1, "slide_key": "cover", "title": "封面",
                        "placeholders": [
                            {"token": "CUSTOMER_NAME", "type": "text", "source": "tenant.name"}
                        ]
                    },
                    {
                        "slide_no": 2, "slide_key": "summary", "title": "态势概览",
                        "placeholders": [
                            {"token": "SUMMARY_PARAGRAPH", "type": "paragraph",
                             "ai_generate": true, "ai_instruction": "总结本期整体安全态势",
                             "max_length": 200},
                            {"token": "KEY_INSIGHTS", "type": "bullet_list",
                             "ai_generate": true, "ai_instruction": "列出关键洞察",
                             "max_items": 3, "max_chars_per_item": 40}
                        ]
                    }
                ]
            }"#,
            "test",
        )
        .unwrap()
    }

    fn tenant() -> TenantInput {
        TenantInput::new(json!({
            "tenant": {"name": "Acme"},
            "period": {"start": "2025-12-01", "end": "2025-12-31"},
            "alerts": {"total": 1024}
        }))
        .unwrap()
    }

    #[test]
    fn test_prompts_are_byte_identical() {
        let template = template();
        let tenant = tenant();
        let a = SlidePromptBuilder::new(&template, &tenant).build();
        let b = SlidePromptBuilder::new(&template, &tenant).build();
        assert_eq!(a, b);
    }

    #[test]
    fn test_user_prompt_contains_raw_data_and_metadata() {
        let template = template();
        let tenant = tenant();
        let prompt = SlidePromptBuilder::new(&template, &tenant).build();
        assert!(prompt.user.contains("- 客户: Acme"));
        assert!(prompt.user.contains("\"total\": 1024"));
    }

    #[test]
    fn test_only_ai_placeholders_listed() {
        let template = template();
        let tenant = tenant();
        let prompt = SlidePromptBuilder::new(&template, &tenant).build();
        assert!(prompt.user.contains("SUMMARY_PARAGRAPH"));
        assert!(prompt.user.contains("KEY_INSIGHTS"));
        // extracted placeholder never reaches the prompt tasks
        assert!(!prompt.user.contains("CUSTOMER_NAME"));
    }

    #[test]
    fn test_constraints_annotated() {
        let template = template();
        let tenant = tenant();
        let prompt = SlidePromptBuilder::new(&template, &tenant).build();
        assert!(prompt.user.contains("不超过200字"));
        assert!(prompt.user.contains("最多3条"));
        assert!(prompt.user.contains("每条不超过40字"));
    }

    #[test]
    fn test_example_output_shape() {
        let template = template();
        let tenant = tenant();
        let prompt = SlidePromptBuilder::new(&template, &tenant).build();
        assert!(prompt.user.contains(r#""slide_key":"summary""#));
        let example: Value =
            serde_json::from_str(prompt.user.split("# 输出格式示例").nth(1).unwrap().trim())
                .unwrap();
        assert!(example["slides"].is_array());
    }

    #[test]
    fn test_system_prompt_carries_contract() {
        let template = template();
        let tenant = tenant();
        let prompt = SlidePromptBuilder::new(&template, &tenant).build();
        assert!(prompt.system.contains("\"slides\""));
        assert!(prompt.system.contains("管理层"));
    }
}
