// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// 内置关键词表，顺序即标签输出顺序
pub const DEFAULT_KEYWORDS: [&str; 47] = [
    "Python",
    "Django",
    "Flask",
    "Git",
    "SQL",
    "REST",
    "API",
    "Docker",
    "AWS",
    "Linux",
    "PostgreSQL",
    "AI",
    "Artificial Intelligence",
    "JavaScript",
    "JS",
    "React",
    "OOP",
    "NoSQL",
    "Networking",
    "Fullstack",
    "Microservice",
    "MongoDB",
    "HTML",
    "CSS",
    "DRF",
    "Asyncio",
    "GraphQL",
    "Machine Learning",
    "Deep Learning",
    "Kubernetes",
    "Terraform",
    "CI/CD",
    "Jenkins",
    "Ansible",
    "Bootstrap",
    "Tailwind",
    "Vue",
    "Angular",
    "TypeScript",
    "Pandas",
    "NumPy",
    "TensorFlow",
    "PyTorch",
    "Data Science",
    "Data Analysis",
    "Big Data",
    "ETL",
];

static DEFAULT_VOCABULARY: Lazy<KeywordVocabulary> =
    Lazy::new(|| KeywordVocabulary::new(DEFAULT_KEYWORDS));

#[derive(Debug, Clone, PartialEq, Eq)]
struct Keyword {
    term: String,
    needle: String,
}

/// 关键词表
///
/// 启动时加载，之后只读。匹配为大小写不敏感的子串匹配，
/// 不做单词边界判断（"AI" 会命中 "email"）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordVocabulary {
    keywords: Vec<Keyword>,
}

impl KeywordVocabulary {
    /// 创建关键词表
    ///
    /// 按小写形式去重，保留首次出现的写法；空白词条被忽略
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let keywords = terms
            .into_iter()
            .filter_map(|term| {
                let term = term.as_ref().trim();
                if term.is_empty() {
                    return None;
                }
                let needle = term.to_lowercase();
                seen.insert(needle.clone()).then(|| Keyword {
                    term: term.to_string(),
                    needle,
                })
            })
            .collect();
        Self { keywords }
    }

    /// 进程级的内置关键词表
    pub fn builtin() -> &'static KeywordVocabulary {
        &DEFAULT_VOCABULARY
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(|k| k.term.as_str())
    }

    /// 计算文本命中的标签
    ///
    /// # 参数
    ///
    /// * `text` - 已规整的正文文本
    ///
    /// # 返回值
    ///
    /// 按词表顺序排列的命中词条
    pub fn tag(&self, text: &str) -> Vec<String> {
        let haystack = text.to_lowercase();
        self.keywords
            .iter()
            .filter(|k| haystack.contains(&k.needle))
            .map(|k| k.term.clone())
            .collect()
    }
}

impl Default for KeywordVocabulary {
    fn default() -> Self {
        DEFAULT_VOCABULARY.clone()
    }
}
