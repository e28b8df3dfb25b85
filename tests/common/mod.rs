// 集成测试公共模块
//
// 提供测试辅助工具和共享样例数据

use rehost::core::{RewriteMode, RewriteRule};

/// 含两处不同 IPv4 地址引用、引号风格各异的样例 CSS
pub const MIXED_ADDRESS_CSS: &str = concat!(
    ".logo { background: url('http://10.0.0.5/images/logo.png'); }\n",
    ".hero { background: url(\"http://192.168.1.2/images/hero.jpg\"); }\n",
    ".icon { background: url(http://10.0.0.5/images/icon.svg); }\n",
);

/// 不含任何 url() 的样例 CSS
pub const PLAIN_CSS: &str = "body { color: red; margin: 0; }";

/// 精确模式规则：仅替换 10.0.0.5
pub fn server_rule() -> RewriteRule {
    RewriteRule::new("https", "example.com").with_server_address("10.0.0.5")
}

/// 任意模式规则：替换所有 IPv4 地址
pub fn any_rule() -> RewriteRule {
    RewriteRule::new("https", "example.com").with_mode(RewriteMode::AnyAddress)
}
