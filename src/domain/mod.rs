// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：搜索入口、职位记录与关键词表
/// - 仓库接口（repositories）：记录输出的抽象接口
/// - 服务（services）：分页展开、列表解析与详情解析
pub mod models;
pub mod repositories;
pub mod services;
