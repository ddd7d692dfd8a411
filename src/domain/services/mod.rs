// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// - 详情解析（detail_extractor）：正文文本与关键词标签
/// - 列表解析（listing_extractor）：从展开后的列表页提取职位摘要
/// - 分页（pagination_service）：驱动"加载更多"按钮直到列表完全展开
pub mod detail_extractor;
pub mod listing_extractor;
pub mod pagination_service;
