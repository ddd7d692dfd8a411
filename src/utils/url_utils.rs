// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::{ParseError, Url};

/// 将详情链接解析为可抓取的绝对URL
///
/// 已是绝对地址的链接原样返回，相对链接基于展开后页面的URL解析；
/// 片段（`#...`）被去除，避免同一详情页被当作不同请求
pub fn resolve_detail_link(page_url: &str, link: &str) -> Result<Url, ParseError> {
    let base = Url::parse(page_url)?;
    let mut resolved = base.join(link.trim())?;
    resolved.set_fragment(None);
    Ok(resolved)
}
