// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::search_query::ExperienceBracket;
use crate::domain::models::vacancy::ListingSummary;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

#[derive(Error, Debug)]
#[error("Invalid selector for {field}: `{selector}`")]
pub struct SelectorError {
    pub field: &'static str,
    pub selector: String,
}

/// 列表页选择器配置
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    pub listing: String,
    pub title: String,
    pub company: String,
    pub salary: String,
    pub cities: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            listing: "li.l-vacancy".to_string(),
            title: "div.title a".to_string(),
            company: "strong a.company".to_string(),
            salary: "span.salary".to_string(),
            cities: "span.cities".to_string(),
        }
    }
}

/// 列表提取器
///
/// 将展开后的搜索结果页解析为职位摘要
pub struct ListingExtractor {
    listing: Selector,
    title: Selector,
    company: Selector,
    salary: Selector,
    cities: Selector,
}

fn compile(field: &'static str, selector: &str) -> Result<Selector, SelectorError> {
    Selector::parse(selector).map_err(|_| SelectorError {
        field,
        selector: selector.to_string(),
    })
}

impl ListingExtractor {
    pub fn new(selectors: &ListingSelectors) -> Result<Self, SelectorError> {
        Ok(Self {
            listing: compile("listing", &selectors.listing)?,
            title: compile("title", &selectors.title)?,
            company: compile("company", &selectors.company)?,
            salary: compile("salary", &selectors.salary)?,
            cities: compile("cities", &selectors.cities)?,
        })
    }

    /// 提取职位摘要
    ///
    /// 惰性迭代，只能遍历一次；缺少标题或链接的节点被静默丢弃，不做去重。
    ///
    /// # 参数
    ///
    /// * `document` - 展开后的页面
    /// * `experience` - 当前搜索入口的经验区间
    pub fn extract<'a>(
        &'a self,
        document: &'a Html,
        experience: ExperienceBracket,
    ) -> impl Iterator<Item = ListingSummary> + 'a {
        document
            .select(&self.listing)
            .filter_map(move |node| self.summarize(node, experience))
    }

    fn summarize(&self, node: ElementRef<'_>, experience: ExperienceBracket) -> Option<ListingSummary> {
        let anchor = node.select(&self.title).next();
        let title = anchor.and_then(first_text)?;
        let detail_link = anchor
            .and_then(|a| a.value().attr("href"))
            .and_then(clean)?;

        Some(ListingSummary {
            title,
            detail_link,
            experience_bracket: experience,
            company: node.select(&self.company).next().and_then(first_text),
            salary_text: node.select(&self.salary).next().and_then(first_text),
            cities_text: node.select(&self.cities).next().and_then(first_text),
        })
    }
}

impl Default for ListingExtractor {
    fn default() -> Self {
        // The built-in selectors are static and known to parse.
        Self::new(&ListingSelectors::default()).expect("default listing selectors are valid")
    }
}

/// 元素的第一个非空直接文本节点
fn first_text(element: ElementRef<'_>) -> Option<String> {
    element
        .children()
        .find_map(|child| child.value().as_text().and_then(|t| clean(t)))
}

fn clean(raw: &str) -> Option<String> {
    let trimmed = raw.trim_matches(|c: char| c.is_whitespace() || c == '\u{a0}');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
