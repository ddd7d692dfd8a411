// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::search_query::ExperienceBracket;
use serde::{Deserialize, Serialize};

/// 搜索结果页上的一条职位摘要
///
/// `title` 与 `detail_link` 必然非空，其余字段可能缺失
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSummary {
    pub title: String,
    pub detail_link: String,
    pub experience_bracket: ExperienceBracket,
    pub company: Option<String>,
    pub salary_text: Option<String>,
    pub cities_text: Option<String>,
}

/// 最终输出的职位记录
///
/// 字段名即下游 sink 消费的字段契约
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacancyRecord {
    pub title: String,
    pub link: String,
    pub exp: ExperienceBracket,
    pub company: Option<String>,
    pub salary: Option<String>,
    pub cities: Option<String>,
    pub tags: Vec<String>,
}

impl VacancyRecord {
    /// 由摘要与标签构建记录
    pub fn from_summary(summary: ListingSummary, tags: Vec<String>) -> Self {
        Self {
            title: summary.title,
            link: summary.detail_link,
            exp: summary.experience_bracket,
            company: summary.company,
            salary: summary.salary_text,
            cities: summary.cities_text,
            tags,
        }
    }
}
