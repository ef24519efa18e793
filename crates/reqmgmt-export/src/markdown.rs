//! # Markdown Rendering
//!
//! Renders a header and its details as a flat key-value document:
//!
//! ```text
//! # 需求文档：REQ-1 - Apollo
//!
//! ## 一、需求列表信息
//!
//! - 需求评估单号: REQ-1
//! - 项目名称: Apollo
//! ...
//! - 备注:
//!
//! ## 二、需求详情信息
//!
//! ### 1. login
//!
//! - 需求评估单号: REQ-1
//! ...
//! ```
//!
//! Every declared field line is always present, in declared order, followed
//! by the remark. The detail section is omitted when there are no details.

use std::fmt::Write;

use reqmgmt_core::{is_blank, FieldRecord, RequirementDetail, RequirementHeader};

/// Label of the remark line closing each section.
pub const REMARK_TITLE: &str = "备注";

pub const HEADER_SECTION: &str = "## 一、需求列表信息";
pub const DETAIL_SECTION: &str = "## 二、需求详情信息";

/// Render one requirement document.
pub fn render(header: &RequirementHeader, details: &[RequirementDetail]) -> String {
    let mut doc = String::new();

    doc.push_str("# 需求文档：");
    doc.push_str(&single_line(&header.req_no));
    if let Some(project) = header.project_name.as_deref().filter(|p| !is_blank(p)) {
        doc.push_str(" - ");
        doc.push_str(&single_line(project));
    }
    doc.push_str("\n\n");

    doc.push_str(HEADER_SECTION);
    doc.push_str("\n\n");
    push_fields(&mut doc, header);

    if !details.is_empty() {
        doc.push('\n');
        doc.push_str(DETAIL_SECTION);
        doc.push_str("\n\n");
        for (index, detail) in details.iter().enumerate() {
            if index > 0 {
                doc.push('\n');
            }
            // Infallible: writing into a String.
            let _ = write!(doc, "### {}. {}\n\n", index + 1, single_line(&detail.req_name));
            push_fields(&mut doc, detail);
        }
    }

    doc
}

fn push_fields<T: FieldRecord>(doc: &mut String, record: &T) {
    for (spec, value) in T::FIELDS.iter().zip(record.values()) {
        push_line(doc, spec.title, &value.to_string());
    }
    push_line(doc, REMARK_TITLE, record.remark().unwrap_or_default());
}

fn push_line(doc: &mut String, title: &str, value: &str) {
    doc.push_str("- ");
    doc.push_str(title);
    doc.push_str(": ");
    doc.push_str(&single_line(value));
    doc.push('\n');
}

/// Replace line breaks so a value stays on its bullet line.
fn single_line(value: &str) -> String {
    value
        .replace("\r\n", " ")
        .replace(['\r', '\n'], " ")
        .trim_end()
        .to_string()
}
