// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::keywords::KeywordVocabulary;
use crate::domain::models::vacancy::{ListingSummary, VacancyRecord};
use crate::domain::services::listing_extractor::SelectorError;
use scraper::{Html, Selector};
use std::sync::Arc;

pub const DEFAULT_CONTENT_SELECTOR: &str = "div.b-typo.vacancy-section";

/// 详情页提取器
///
/// 拼接正文文本并按关键词表打标签，每个详情页恰好产出一条记录
pub struct DetailExtractor {
    content: Selector,
    vocabulary: Arc<KeywordVocabulary>,
}

impl DetailExtractor {
    pub fn new(content_selector: &str, vocabulary: Arc<KeywordVocabulary>) -> Result<Self, SelectorError> {
        let content = Selector::parse(content_selector).map_err(|_| SelectorError {
            field: "content",
            selector: content_selector.to_string(),
        })?;
        Ok(Self { content, vocabulary })
    }

    /// 生成职位记录
    ///
    /// # 参数
    ///
    /// * `html` - 详情页原始 HTML
    /// * `summary` - 列表阶段得到的摘要
    ///
    /// # 返回值
    ///
    /// 职位记录；正文容器缺失时标签为空，记录照常产出
    pub fn extract(&self, html: &str, summary: ListingSummary) -> VacancyRecord {
        let text = self.content_text(html);
        let tags = self.vocabulary.tag(&text);
        VacancyRecord::from_summary(summary, tags)
    }

    /// 正文文本
    ///
    /// 收集容器内部元素的直接文本节点（容器自身的直接文本不计），
    /// 逐个去除首尾空白、跳过空节点、以单个空格拼接，最后将 U+00A0 替换为空格
    pub fn content_text(&self, html: &str) -> String {
        let document = Html::parse_document(html);
        let mut parts: Vec<&str> = Vec::new();

        for container in document.select(&self.content) {
            for node in container.descendants() {
                let Some(text) = node.value().as_text() else {
                    continue;
                };
                let inside_element = node
                    .parent()
                    .is_some_and(|parent| parent.id() != container.id() && parent.value().is_element());
                if !inside_element {
                    continue;
                }
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    parts.push(trimmed);
                }
            }
        }

        parts.join(" ").replace('\u{a0}', " ")
    }
}

impl Default for DetailExtractor {
    fn default() -> Self {
        Self::new(
            DEFAULT_CONTENT_SELECTOR,
            Arc::new(KeywordVocabulary::builtin().clone()),
        )
        .expect("default content selector is valid")
    }
}
