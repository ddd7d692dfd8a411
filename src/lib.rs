// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 编排浏览器分页、列表解析与详情抓取的爬取用例
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含职位记录、关键词表以及解析与分页服务
pub mod domain;

/// 引擎模块
///
/// 浏览器会话与HTTP抓取的实现
pub mod engines;

/// 基础设施模块
///
/// 指标导出与记录输出
pub mod infrastructure;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;
