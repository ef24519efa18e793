//! # Requirement Records
//!
//! [`RequirementHeader`] is one requirement evaluation, identified by its
//! business-assigned ticket number (`req_no`). [`RequirementDetail`] is a
//! sub-item of a header, identified by the pair (`req_no`, `req_name`) and
//! carrying a store-assigned surrogate `id`.
//!
//! Both records serialize with camelCase field names and render timestamps
//! as `yyyy-MM-dd HH:mm:ss`.

use std::fmt;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::fields::{FieldKind, FieldRecord, FieldSlot, FieldSpec, FieldValue};

/// Empty after trimming whitespace.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Implements [`FieldRecord`] from a declared field list.
macro_rules! field_table {
    (
        $record:ty,
        kind = $kind_name:literal,
        keys = [$($key:ident),+ $(,)?],
        fields = { $($field:ident : $fkind:ident => $title:literal),+ $(,)? }
    ) => {
        impl FieldRecord for $record {
            const KIND: &'static str = $kind_name;

            const FIELDS: &'static [FieldSpec] = &[
                $(FieldSpec {
                    name: stringify!($field),
                    title: $title,
                    kind: FieldKind::$fkind,
                }),+
            ];

            const KEYS: &'static [&'static str] = &[$(stringify!($key)),+];

            fn values(&self) -> Vec<FieldValue<'_>> {
                vec![$(FieldSlot::view(&self.$field)),+]
            }

            fn slots_mut(&mut self) -> Vec<&mut dyn FieldSlot> {
                vec![$(&mut self.$field as &mut dyn FieldSlot),+]
            }

            fn remark(&self) -> Option<&str> {
                self.remark.as_deref()
            }
        }
    };
}

// -- Requirement header ---------------------------------------------------------

/// A requirement evaluation (需求列表 row).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct RequirementHeader {
    /// Evaluation ticket number (primary key).
    pub req_no: String,
    pub project_name: Option<String>,
    pub opportunity_no: Option<String>,
    pub industry: Option<String>,
    pub sub_industry: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub product_line: Option<String>,
    pub product_series: Option<String>,
    pub product_model: Option<String>,
    pub software_name: Option<String>,
    pub software_version: Option<String>,
    pub status: Option<String>,
    pub is_scheduled: Option<String>,
    pub is_reuse: Option<String>,
    pub urgency: Option<String>,
    pub eval_type: Option<String>,
    pub creator: Option<String>,
    pub creator_dept: Option<String>,
    pub req_owner: Option<String>,
    pub owner_dept: Option<String>,
    pub current_handler: Option<String>,
    #[serde(default, with = "timestamp")]
    #[schema(value_type = Option<String>, example = "2024-01-15 09:30:00")]
    pub create_time: Option<NaiveDateTime>,
    #[serde(default, with = "timestamp")]
    #[schema(value_type = Option<String>)]
    pub submit_time: Option<NaiveDateTime>,
    #[serde(default, with = "timestamp")]
    #[schema(value_type = Option<String>)]
    pub last_submit_time: Option<NaiveDateTime>,
    #[serde(default, with = "timestamp")]
    #[schema(value_type = Option<String>)]
    pub eval_time: Option<NaiveDateTime>,
    #[serde(default, with = "timestamp")]
    #[schema(value_type = Option<String>)]
    pub last_eval_time: Option<NaiveDateTime>,
    /// Total evaluation hours.
    pub total_eval_hours: Option<Decimal>,
    /// Days the evaluation stayed open.
    pub eval_stay_days: Option<Decimal>,
    #[serde(default, with = "timestamp")]
    #[schema(value_type = Option<String>)]
    pub schedule_start_time: Option<NaiveDateTime>,
    #[serde(default, with = "timestamp")]
    #[schema(value_type = Option<String>)]
    pub schedule_end_time: Option<NaiveDateTime>,
    /// Total workload in person-days.
    pub total_workload: Option<Decimal>,
    pub dev_hq_workload: Option<Decimal>,
    pub dev_region: Option<String>,
    pub dev_region_workload: Option<Decimal>,
    pub total_order_workload: Option<Decimal>,
    pub order_hq_workload: Option<Decimal>,
    pub order_region: Option<String>,
    pub order_region_workload: Option<Decimal>,
    pub system_test_workload: Option<Decimal>,
    pub integration_test_workload: Option<Decimal>,
    pub learning_cost_workload: Option<Decimal>,
    pub process_manage_workload: Option<Decimal>,
    pub other_workload_detail: Option<String>,
    #[serde(default, with = "timestamp")]
    #[schema(value_type = Option<String>)]
    pub expected_complete_time: Option<NaiveDateTime>,
    pub custom_no: Option<String>,
    pub jkn_no: Option<String>,
    pub dev_no: Option<String>,
    pub remark: Option<String>,
    /// Set by the store on insert.
    #[serde(default, with = "timestamp")]
    #[schema(value_type = Option<String>)]
    pub created_at: Option<NaiveDateTime>,
    /// Set by the store on every write.
    #[serde(default, with = "timestamp")]
    #[schema(value_type = Option<String>)]
    pub updated_at: Option<NaiveDateTime>,
}

field_table! {
    RequirementHeader,
    kind = "requirement header",
    keys = [req_no],
    fields = {
        req_no: Text => "需求评估单号",
        project_name: Text => "项目名称",
        opportunity_no: Text => "商机编号",
        industry: Text => "行业",
        sub_industry: Text => "子行业",
        region: Text => "区域",
        country: Text => "国家或地区",
        product_line: Text => "产品线",
        product_series: Text => "产品系列",
        product_model: Text => "产品型号",
        software_name: Text => "软件名称",
        software_version: Text => "软件版本",
        status: Text => "状态",
        is_scheduled: Text => "是否排期",
        is_reuse: Text => "是否复用方案",
        urgency: Text => "紧急程度",
        eval_type: Text => "评估类型",
        creator: Text => "评估单创建人",
        creator_dept: Text => "创建人部门",
        req_owner: Text => "需求负责人",
        owner_dept: Text => "负责人所属部门",
        current_handler: Text => "当前处理人",
        create_time: Timestamp => "评估单创建时间",
        submit_time: Timestamp => "评估单提交时间",
        last_submit_time: Timestamp => "最后提交时间",
        eval_time: Timestamp => "评估时间",
        last_eval_time: Timestamp => "最后评估时间",
        total_eval_hours: Decimal => "总评估用时（小时）",
        eval_stay_days: Decimal => "评估停留时间（天）",
        schedule_start_time: Timestamp => "排期开始时间",
        schedule_end_time: Timestamp => "排期结束时间",
        total_workload: Decimal => "总工作量（人天）",
        dev_hq_workload: Decimal => "开发资源分布总部工作量(人天)",
        dev_region: Text => "开发资源分布区域",
        dev_region_workload: Decimal => "开发资源分布区域工作量(人天)",
        total_order_workload: Decimal => "总订单核算工作量（人天）",
        order_hq_workload: Decimal => "订单核算总部工作量(人天)",
        order_region: Text => "订单核算区域",
        order_region_workload: Decimal => "订单核算区域工作量(人天)",
        system_test_workload: Decimal => "系统测试工作量（人天）",
        integration_test_workload: Decimal => "集成测试工作量（人天）",
        learning_cost_workload: Decimal => "学习成本工作量（人天）",
        process_manage_workload: Decimal => "流程管理工作量（人天）",
        other_workload_detail: Text => "其他工作量详情",
        expected_complete_time: Timestamp => "期望完成时间",
        custom_no: Text => "定制单号",
        jkn_no: Text => "JKN单号",
        dev_no: Text => "开发单号",
    }
}

impl RequirementHeader {
    /// A header with only its ticket number set.
    pub fn new(req_no: impl Into<String>) -> Self {
        Self {
            req_no: req_no.into(),
            ..Self::default()
        }
    }
}

// -- Requirement detail ---------------------------------------------------------

/// A sub-item of a requirement evaluation (需求详情 row).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct RequirementDetail {
    /// Surrogate id assigned by the store; `None` until inserted.
    pub id: Option<i64>,
    /// Evaluation ticket number of the owning header.
    pub req_no: String,
    pub project_name: Option<String>,
    pub opportunity_no: Option<String>,
    pub industry: Option<String>,
    pub sub_industry: Option<String>,
    pub region: Option<String>,
    pub product_line: Option<String>,
    pub product_series: Option<String>,
    pub product_model: Option<String>,
    pub software_name: Option<String>,
    pub software_version: Option<String>,
    pub status: Option<String>,
    /// Detail name; unique within one ticket number.
    pub req_name: String,
    pub req_scene: Option<String>,
    pub req_desc: Option<String>,
    pub rd_eval: Option<String>,
    pub component_id: Option<String>,
    pub component_version: Option<String>,
    pub req_category: Option<String>,
    pub req_tag: Option<String>,
    pub is_reuse: Option<String>,
    pub creator: Option<String>,
    pub req_owner: Option<String>,
    pub owner_dept: Option<String>,
    pub evaluator: Option<String>,
    pub evaluator_dept: Option<String>,
    #[serde(default, with = "timestamp")]
    #[schema(value_type = Option<String>)]
    pub create_time: Option<NaiveDateTime>,
    #[serde(default, with = "timestamp")]
    #[schema(value_type = Option<String>)]
    pub submit_time: Option<NaiveDateTime>,
    #[serde(default, with = "timestamp")]
    #[schema(value_type = Option<String>)]
    pub complete_time: Option<NaiveDateTime>,
    #[serde(default, with = "timestamp")]
    #[schema(value_type = Option<String>)]
    pub component_eval_start_time: Option<NaiveDateTime>,
    #[serde(default, with = "timestamp")]
    #[schema(value_type = Option<String>)]
    pub component_eval_end_time: Option<NaiveDateTime>,
    pub component_eval_cycle: Option<String>,
    pub eval_hours: Option<Decimal>,
    pub eval_workload: Option<Decimal>,
    pub workload_detail: Option<String>,
    pub stay_time: Option<Decimal>,
    #[serde(default, with = "timestamp")]
    #[schema(value_type = Option<String>)]
    pub rd_schedule_start_time: Option<NaiveDateTime>,
    #[serde(default, with = "timestamp")]
    #[schema(value_type = Option<String>)]
    pub rd_schedule_end_time: Option<NaiveDateTime>,
    #[serde(default, with = "timestamp")]
    #[schema(value_type = Option<String>)]
    pub schedule_start_time: Option<NaiveDateTime>,
    #[serde(default, with = "timestamp")]
    #[schema(value_type = Option<String>)]
    pub schedule_end_time: Option<NaiveDateTime>,
    pub custom_no: Option<String>,
    pub dev_no: Option<String>,
    pub remark: Option<String>,
    #[serde(default, with = "timestamp")]
    #[schema(value_type = Option<String>)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, with = "timestamp")]
    #[schema(value_type = Option<String>)]
    pub updated_at: Option<NaiveDateTime>,
}

field_table! {
    RequirementDetail,
    kind = "requirement detail",
    keys = [req_no, req_name],
    fields = {
        req_no: Text => "需求评估单号",
        project_name: Text => "项目名称",
        opportunity_no: Text => "商机编号",
        industry: Text => "行业",
        sub_industry: Text => "子行业",
        region: Text => "区域",
        product_line: Text => "产品线",
        product_series: Text => "产品系列",
        product_model: Text => "产品型号",
        software_name: Text => "软件名称",
        software_version: Text => "软件版本",
        status: Text => "状态",
        req_name: Text => "需求名称",
        req_scene: Text => "需求场景",
        req_desc: Text => "需求描述",
        rd_eval: Text => "研发评估",
        component_id: Text => "组件标识",
        component_version: Text => "组件版本",
        req_category: Text => "需求分类",
        req_tag: Text => "需求标签",
        is_reuse: Text => "是否复用方案",
        creator: Text => "评估单创建人",
        req_owner: Text => "需求负责人",
        owner_dept: Text => "负责人所属部门",
        evaluator: Text => "评估人",
        evaluator_dept: Text => "评估人所属部门",
        create_time: Timestamp => "评估单创建时间",
        submit_time: Timestamp => "评估单提交时间",
        complete_time: Timestamp => "评估单完成时间",
        component_eval_start_time: Timestamp => "组件评估开始时间",
        component_eval_end_time: Timestamp => "组件评估完成时间",
        component_eval_cycle: Text => "组件评估周期",
        eval_hours: Decimal => "评估用时(h)",
        eval_workload: Decimal => "评估工作量",
        workload_detail: Text => "工作量详情",
        stay_time: Decimal => "停留时间",
        rd_schedule_start_time: Timestamp => "排期开始时间（研发评估）",
        rd_schedule_end_time: Timestamp => "排期结束时间（研发评估）",
        schedule_start_time: Timestamp => "排期开始时间",
        schedule_end_time: Timestamp => "排期结束时间",
        custom_no: Text => "定制单号",
        dev_no: Text => "开发单号",
    }
}

impl RequirementDetail {
    /// A detail with only its natural key set.
    pub fn new(req_no: impl Into<String>, req_name: impl Into<String>) -> Self {
        Self {
            req_no: req_no.into(),
            req_name: req_name.into(),
            ..Self::default()
        }
    }

    /// The natural upsert key of this detail.
    pub fn key(&self) -> DetailKey {
        DetailKey {
            req_no: self.req_no.clone(),
            req_name: self.req_name.clone(),
        }
    }
}

/// Natural key of a [`RequirementDetail`]: ticket number plus detail name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DetailKey {
    pub req_no: String,
    pub req_name: String,
}

impl fmt::Display for DetailKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.req_no, self.req_name)
    }
}

/// Serde adapter for `Option<NaiveDateTime>` in `yyyy-MM-dd HH:mm:ss`.
///
/// Deserialization also accepts ISO-8601 (`2024-01-15T09:30:00`).
pub mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::fields::TIMESTAMP_FORMAT;

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(t) => serializer.collect_str(&t.format(TIMESTAMP_FORMAT)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
                .or_else(|_| s.parse::<NaiveDateTime>())
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
