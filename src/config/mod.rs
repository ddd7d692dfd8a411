// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理搜索入口、分页、浏览器、详情抓取与输出的配置
pub mod settings;
