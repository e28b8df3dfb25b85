//! URL 与路径工具函数
//!
//! 为 url() 重写提供判定与路径处理支持：IPv4 字面量校验、协议前缀
//! 判断、请求主机提取、以及 `segment/../` 的定点折叠。

use std::net::Ipv4Addr;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use url::Url;

/// 匹配可折叠的 `segment/../` 的正则模式
///
/// 捕获组 1 为段前边界（行首或 `/`），捕获组 2 为被移除的段。段本身
/// 为 `..` 时不可折叠，该判断在替换回调中进行。
pub const PARENT_SEGMENT_PATTERN: &str = r"(^|/)([^/]+)/\.\./";

static PARENT_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PARENT_SEGMENT_PATTERN).unwrap());

/// Checks whether the given string is a valid IPv4 literal
///
/// Used to validate the configured server address before building the
/// exact-address pattern; anything that does not parse as a dotted-quad
/// address disables exact-address rewriting.
pub fn is_ipv4_literal(value: &str) -> bool {
    value.parse::<Ipv4Addr>().is_ok()
}

/// Checks whether a url() value starts with a scheme prefix
///
/// A scheme prefix is one or more ASCII letters followed by `:`, which
/// covers `http:`, `https:`, `data:`, `mailto:` and friends. Such values
/// are external references and never treated as relative paths.
pub fn has_scheme_prefix(value: &str) -> bool {
    match value.split_once(':') {
        Some((scheme, _)) => !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphabetic()),
        None => false,
    }
}

/// Returns the HTTP host of a request URL, with its non-default port
///
/// 与 Symfony 的 getHttpHost() 一致：默认端口（http 的 80、https 的
/// 443）省略，其余端口以 `host:port` 形式给出。无主机的 URL 返回空串。
pub fn http_host(request_url: &Url) -> String {
    let host = match request_url.host_str() {
        Some(host) => host,
        None => return String::new(),
    };

    match request_url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// 折叠路径中的 `segment/../`，直到没有变化为止
///
/// 每一轮把所有 `segment/../` 替换为段前边界；前导 `../`（段本身为
/// `..`）永远不被移除，因此超出根目录的路径原样保留。每轮要么缩短
/// 字符串要么达到定点，循环必然终止。
///
/// # 示例
///
/// ```rust
/// use rehost::utils::url::collapse_parent_segments;
///
/// assert_eq!(collapse_parent_segments("a/b/../c.png"), "a/c.png");
/// assert_eq!(collapse_parent_segments("../../x.png"), "../../x.png");
/// ```
pub fn collapse_parent_segments(path: &str) -> String {
    let mut current = path.to_string();

    loop {
        let collapsed = PARENT_SEGMENT
            .replace_all(&current, |caps: &Captures| {
                if &caps[2] == ".." {
                    caps[0].to_string()
                } else {
                    caps[1].to_string()
                }
            })
            .into_owned();

        if collapsed == current {
            return current;
        }

        current = collapsed;
    }
}
