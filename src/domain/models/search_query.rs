// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

/// 搜索入口解析错误
#[derive(Error, Debug, PartialEq, Eq)]
pub enum QueryError {
    #[error("Invalid start URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Start URL {0} has no `exp` parameter")]
    MissingExperience(String),

    #[error("Unknown experience bracket `{0}`")]
    UnknownExperience(String),
}

/// 工作经验区间
///
/// 对应搜索 URL 中的 `exp` 参数，序列化后与参数值完全一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExperienceBracket {
    #[serde(rename = "0-1")]
    UpToOne,
    #[serde(rename = "1-3")]
    OneToThree,
    #[serde(rename = "3-5")]
    ThreeToFive,
    #[serde(rename = "5plus")]
    FivePlus,
}

impl ExperienceBracket {
    pub const ALL: [ExperienceBracket; 4] = [
        ExperienceBracket::UpToOne,
        ExperienceBracket::OneToThree,
        ExperienceBracket::ThreeToFive,
        ExperienceBracket::FivePlus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceBracket::UpToOne => "0-1",
            ExperienceBracket::OneToThree => "1-3",
            ExperienceBracket::ThreeToFive => "3-5",
            ExperienceBracket::FivePlus => "5plus",
        }
    }
}

impl fmt::Display for ExperienceBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExperienceBracket {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|bracket| bracket.as_str() == s)
            .ok_or_else(|| QueryError::UnknownExperience(s.to_string()))
    }
}

/// 搜索入口
///
/// 一个包含分类与经验区间的起始 URL，每个爬取入口一个，创建后不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    url: Url,
    category: Option<String>,
    experience: ExperienceBracket,
}

impl SearchQuery {
    /// 从起始 URL 解析搜索入口
    ///
    /// # 参数
    ///
    /// * `raw` - 起始 URL，必须携带 `exp` 查询参数
    ///
    /// # 返回值
    ///
    /// * `Ok(SearchQuery)` - 解析成功
    /// * `Err(QueryError)` - URL 无效或经验区间缺失/未知
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        let url = Url::parse(raw).map_err(|e| QueryError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        let mut category = None;
        let mut experience = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "category" => category = Some(value.into_owned()),
                "exp" => experience = Some(value.parse::<ExperienceBracket>()?),
                _ => {}
            }
        }

        let experience = experience.ok_or_else(|| QueryError::MissingExperience(raw.to_string()))?;

        Ok(Self {
            url,
            category,
            experience,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn experience(&self) -> ExperienceBracket {
        self.experience
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}
