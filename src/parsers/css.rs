//! CSS url() 重写模块
//!
//! 此模块提供对聚合后 CSS 文本的 url() 地址重写功能。聚合管线在生成 CSS
//! 时会把生成请求所见到的主机（往往是内部负载均衡 IP 或容器地址）写进
//! 缓存文件，导致浏览器向错误的主机请求资源。本模块通过正则匹配 url()
//! 出现位置，把 IPv4 字面量主机替换为规范的公开主机名和协议。
//!
//! # 主要功能
//!
//! - **地址重写**: 将 url() 中的 IPv4 主机替换为配置的 scheme://host
//! - **两种模式**: 仅匹配本机地址（精确模式）或匹配任意 IPv4 地址
//! - **相对路径锚定**: 将相对 url() 路径折叠 `../` 后补全为绝对 URL
//! - **引号保持**: 原样保留每处 url() 的开闭引号字符
//!
//! 匹配仅针对 url() 结构本身，不做任何 CSS 语法解析或校验；零替换时
//! 原样返回输入（借用），调用方可据此跳过"内容已变更"类副作用。

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::core::{RewriteMode, RewriteResult, RewriteRule};
use crate::utils::url::{collapse_parent_segments, has_scheme_prefix, is_ipv4_literal};

/// 匹配 url() 中任意 IPv4 地址主机的正则模式
///
/// 匹配形如 `url("http://10.0.0.5/path/file.png")` 的出现位置，引号可为
/// 单引号、双引号或省略，开闭引号分别捕获。地址为四组 1-3 位数字的点分
/// 形式，不校验取值范围。
pub const CSS_URL_ANY_ADDRESS_PATTERN: &str = r#"(?i)url\(\s*(?P<open>['"]?)https?://(?P<address>\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})/(?P<path>[^'")]+)(?P<close>['"]?)\s*\)"#;

/// 匹配 url() 中指定服务器地址的正则模式模板
///
/// `{address}` 占位符由 [`server_address_regex`] 以转义后的地址字面量
/// 填充，其余结构与 [`CSS_URL_ANY_ADDRESS_PATTERN`] 一致。
pub const CSS_URL_SERVER_ADDRESS_TEMPLATE: &str =
    r#"(?i)url\(\s*(?P<open>['"]?)https?://{address}/(?P<path>[^'")]+)(?P<close>['"]?)\s*\)"#;

/// 匹配所有 url() 值的正则模式
///
/// 用于相对路径锚定。值本身不含引号与右括号；外部地址、绝对路径和
/// 片段引用的排除在替换回调中进行（regex crate 不支持环视）。
pub const CSS_URL_VALUE_PATTERN: &str =
    r#"(?i)url\(\s*(?P<open>['"]?)(?P<value>[^'")]+)(?P<close>['"]?)\s*\)"#;

static CSS_URL_ANY_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(CSS_URL_ANY_ADDRESS_PATTERN).unwrap());

static CSS_URL_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(CSS_URL_VALUE_PATTERN).unwrap());

/// 构建匹配指定服务器地址的正则
///
/// 地址会先经 `regex::escape` 转义再填入模板；编译失败时返回 None，
/// 调用方按零匹配处理。
fn server_address_regex(server_address: &str) -> Option<Regex> {
    let pattern =
        CSS_URL_SERVER_ADDRESS_TEMPLATE.replace("{address}", &regex::escape(server_address));

    Regex::new(&pattern).ok()
}

/// 重写 CSS 内容中 IPv4 主机形式的 url() 地址
///
/// 这是地址重写的唯一入口，按 `rule.mode` 选择精确模式或任意模式；
/// 两种模式绝不同时运行。替换把匹配到的 `scheme://address` 换成
/// `rule.scheme://rule.host`，路径与引号字符逐字保留。
///
/// 以下情况整体降级为无操作（返回借用的原内容，计数为零）：
///
/// - `rule.host` 为空（无法解析出目标主机）
/// - 精确模式下服务器地址为空或不是合法 IPv4 字面量
///
/// # 参数
///
/// * `content` - 待处理的完整 CSS 文本
/// * `rule` - 本次处理上下文的重写配置
///
/// # 返回值
///
/// 重写结果；`count` 为替换总数，`addresses` 为按首见顺序去重的地址
/// 列表。零替换时 `content` 为借用的输入。
///
/// # 示例
///
/// ```rust
/// use rehost::core::{RewriteMode, RewriteRule};
/// use rehost::parsers::css::rewrite_addresses;
///
/// let rule = RewriteRule::new("https", "example.com").with_mode(RewriteMode::AnyAddress);
/// let result = rewrite_addresses("body { background: url(http://10.0.0.5/bg.png); }", &rule);
///
/// assert_eq!(
///     result.content,
///     "body { background: url(https://example.com/bg.png); }"
/// );
/// ```
pub fn rewrite_addresses<'a>(content: &'a str, rule: &RewriteRule) -> RewriteResult<'a> {
    // 目标主机为空时不产出畸形 URL，直接原样返回
    if rule.host.is_empty() {
        return RewriteResult::unchanged(content);
    }

    match rule.mode {
        RewriteMode::ServerAddress => rewrite_server_address(content, rule),
        RewriteMode::AnyAddress => rewrite_any_address(content, rule),
    }
}

/// 精确模式：只替换与配置的服务器地址完全相等的出现位置
fn rewrite_server_address<'a>(content: &'a str, rule: &RewriteRule) -> RewriteResult<'a> {
    if !is_ipv4_literal(&rule.server_address) {
        return RewriteResult::unchanged(content);
    }

    let pattern = match server_address_regex(&rule.server_address) {
        Some(pattern) => pattern,
        None => return RewriteResult::unchanged(content),
    };

    let mut count: usize = 0;

    let replaced = pattern.replace_all(content, |caps: &Captures| {
        count += 1;

        format!(
            "url({}{}://{}/{}{})",
            &caps["open"], rule.scheme, rule.host, &caps["path"], &caps["close"]
        )
    });

    if count == 0 {
        return RewriteResult::unchanged(content);
    }

    RewriteResult {
        content: replaced,
        addresses: vec![rule.server_address.clone()],
        count,
    }
}

/// 任意模式：替换所有 IPv4 点分形式的主机，并按首见顺序收集地址
fn rewrite_any_address<'a>(content: &'a str, rule: &RewriteRule) -> RewriteResult<'a> {
    let mut addresses: Vec<String> = Vec::new();
    let mut count: usize = 0;

    let replaced = CSS_URL_ANY_ADDRESS.replace_all(content, |caps: &Captures| {
        count += 1;

        let address = &caps["address"];

        if !addresses.iter().any(|seen| seen == address) {
            addresses.push(address.to_string());
        }

        format!(
            "url({}{}://{}/{}{})",
            &caps["open"], rule.scheme, rule.host, &caps["path"], &caps["close"]
        )
    });

    if count == 0 {
        return RewriteResult::unchanged(content);
    }

    RewriteResult {
        content: replaced,
        addresses,
        count,
    }
}

/// 将相对 url() 路径锚定为绝对 URL
///
/// 聚合器把多个 CSS 文件合并后，文件内相对自身目录的 url() 引用会
/// 失效。此函数把每个相对值加上 `base_path` 目录前缀，折叠其中的
/// `segment/../`，再补全为 `scheme://host/` 开头的绝对 URL。
///
/// 以下 url() 值不属于相对路径，保持原样：
///
/// - 带协议前缀的外部地址（`https:`、`data:` 等）
/// - 以 `/` 开头的绝对路径（含协议相对 `//`）
/// - `#` 或 `%23` 开头的片段引用（SVG 内部引用）
///
/// 无法折叠的前导 `../` 会原样保留在结果路径中，不会死循环。
///
/// # 参数
///
/// * `content` - 待处理的完整 CSS 文本
/// * `base_path` - CSS 文件自身所在目录，可带或不带首尾斜杠
/// * `rule` - 本次处理上下文的重写配置
pub fn rewrite_relative_urls<'a>(
    content: &'a str,
    base_path: &str,
    rule: &RewriteRule,
) -> RewriteResult<'a> {
    if rule.host.is_empty() {
        return RewriteResult::unchanged(content);
    }

    let directory = normalize_directory(base_path);

    let mut count: usize = 0;

    let replaced = CSS_URL_VALUE.replace_all(content, |caps: &Captures| {
        let value = &caps["value"];

        if !is_relative_path(value) {
            return caps[0].to_string();
        }

        count += 1;

        let path = collapse_parent_segments(&format!("{}{}", directory, value));

        format!(
            "url({}{}://{}/{}{})",
            &caps["open"], rule.scheme, rule.host, path, &caps["close"]
        )
    });

    if count == 0 {
        return RewriteResult::unchanged(content);
    }

    RewriteResult {
        content: replaced,
        addresses: Vec::new(),
        count,
    }
}

/// 规范化目录前缀：去除首尾斜杠，非空时补一个尾部斜杠
fn normalize_directory(base_path: &str) -> String {
    let trimmed = base_path.trim_matches('/');

    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}

/// 判断 url() 值是否为需要锚定的相对路径
fn is_relative_path(value: &str) -> bool {
    !(value.starts_with('/')
        || value.starts_with('#')
        || value.starts_with("%23")
        || has_scheme_prefix(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    fn server_rule() -> RewriteRule {
        RewriteRule::new("https", "example.com").with_server_address("10.0.0.5")
    }

    fn any_rule() -> RewriteRule {
        RewriteRule::new("https", "example.com").with_mode(RewriteMode::AnyAddress)
    }

    #[test]
    fn test_server_address_rewrite() {
        let css = ".logo { background: url(http://10.0.0.5/a.png); }";
        let result = rewrite_addresses(css, &server_rule());

        assert_eq!(
            result.content,
            ".logo { background: url(https://example.com/a.png); }"
        );
        assert_eq!(result.count, 1);
        assert_eq!(result.addresses, vec!["10.0.0.5".to_string()]);
    }

    #[test]
    fn test_server_address_ignores_other_addresses() {
        let css = ".a { background: url(http://192.168.1.2/b.png); }";
        let result = rewrite_addresses(css, &server_rule());

        assert_eq!(result.content, css);
        assert_eq!(result.count, 0);
    }

    #[test]
    fn test_any_address_collects_first_seen_order() {
        let css = "url('http://10.0.0.5/a.png') url(\"http://192.168.1.2/b.png\") url(http://10.0.0.5/c.png)";
        let result = rewrite_addresses(css, &any_rule());

        assert_eq!(
            result.content,
            "url('https://example.com/a.png') url(\"https://example.com/b.png\") url(https://example.com/c.png)"
        );
        assert_eq!(result.count, 3);
        assert_eq!(
            result.addresses,
            vec!["10.0.0.5".to_string(), "192.168.1.2".to_string()]
        );
    }

    #[test]
    fn test_quote_characters_preserved_independently() {
        // 开闭引号不一致时也分别原样保留
        let css = "url('http://10.0.0.5/x\")";
        let result = rewrite_addresses(css, &server_rule());

        assert_eq!(result.content, "url('https://example.com/x\")");
    }

    #[test]
    fn test_https_occurrence_rewritten_to_rule_scheme() {
        let css = "url(https://10.0.0.5/a.png)";
        let rule = RewriteRule::new("http", "example.com").with_server_address("10.0.0.5");
        let result = rewrite_addresses(css, &rule);

        assert_eq!(result.content, "url(http://example.com/a.png)");
    }

    #[test]
    fn test_no_match_returns_borrowed_content() {
        let css = "body { color: red; }";
        let result = rewrite_addresses(css, &any_rule());

        assert!(matches!(result.content, Cow::Borrowed(_)));
        assert_eq!(result.count, 0);
        assert!(result.addresses.is_empty());
    }

    #[test]
    fn test_empty_host_is_noop() {
        let css = "url(http://10.0.0.5/a.png)";
        let rule = RewriteRule::new("https", "").with_server_address("10.0.0.5");
        let result = rewrite_addresses(css, &rule);

        assert_eq!(result.content, css);
        assert_eq!(result.count, 0);
    }

    #[test]
    fn test_empty_server_address_is_noop() {
        let css = "url(http://10.0.0.5/a.png)";
        let rule = RewriteRule::new("https", "example.com");
        let result = rewrite_addresses(css, &rule);

        assert_eq!(result.content, css);
        assert_eq!(result.count, 0);
    }

    #[test]
    fn test_invalid_server_address_is_noop() {
        let css = "url(http://10.0.0.5/a.png)";
        let rule = RewriteRule::new("https", "example.com").with_server_address("not-an-address");
        let result = rewrite_addresses(css, &rule);

        assert_eq!(result.count, 0);
    }

    #[test]
    fn test_hostname_urls_left_alone() {
        let css = "url(https://cdn.example.net/a.png)";
        let result = rewrite_addresses(css, &any_rule());

        assert_eq!(result.content, css);
        assert_eq!(result.count, 0);
    }

    #[test]
    fn test_relative_path_anchored() {
        let css = ".icon { background: url(images/icon.png); }";
        let result = rewrite_relative_urls(css, "themes/alpha/css", &server_rule());

        assert_eq!(
            result.content,
            ".icon { background: url(https://example.com/themes/alpha/css/images/icon.png); }"
        );
        assert_eq!(result.count, 1);
    }

    #[test]
    fn test_relative_parent_segments_collapsed() {
        let css = "url(../images/bg.jpg)";
        let result = rewrite_relative_urls(css, "themes/alpha/css", &server_rule());

        assert_eq!(
            result.content,
            "url(https://example.com/themes/alpha/images/bg.jpg)"
        );
    }

    #[test]
    fn test_relative_skips_external_absolute_and_fragment_values() {
        let css = "url(https://cdn.example.net/a.png) url(/already/abs.png) url(#marker) url(%23marker) url(data:image/png;base64,AAAA)";
        let result = rewrite_relative_urls(css, "themes/alpha/css", &server_rule());

        assert_eq!(result.content, css);
        assert_eq!(result.count, 0);
        assert!(matches!(result.content, Cow::Borrowed(_)));
    }

    #[test]
    fn test_relative_quotes_preserved() {
        let css = "url('images/a.png') url(\"images/b.png\")";
        let result = rewrite_relative_urls(css, "css", &server_rule());

        assert_eq!(
            result.content,
            "url('https://example.com/css/images/a.png') url(\"https://example.com/css/images/b.png\")"
        );
    }

    #[test]
    fn test_relative_empty_base_path() {
        let css = "url(images/a.png)";
        let result = rewrite_relative_urls(css, "", &server_rule());

        assert_eq!(result.content, "url(https://example.com/images/a.png)");
    }
}
