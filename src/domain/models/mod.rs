// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// - 搜索入口（search_query）：带经验区间的搜索URL
/// - 职位（vacancy）：列表摘要与最终输出记录
/// - 关键词（keywords）：技能关键词表与打标
pub mod keywords;
pub mod search_query;
pub mod vacancy;
