//! # 解析器模块
//!
//! 这个模块包含对 CSS 资源文本的扫描与重写功能：
//!
//! - url() 出现位置的匹配
//! - IPv4 地址主机的替换（精确模式 / 任意模式）
//! - 相对路径的锚定与折叠
//!
//! # 模块组织
//!
//! - `css` - CSS url() 匹配模式与重写例程

pub mod css;

// Re-export commonly used items for convenience
pub use self::css::{rewrite_addresses, rewrite_relative_urls};
