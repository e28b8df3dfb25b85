//! # 工具模块
//!
//! 这个模块包含各种工具函数和实用程序：
//!
//! - IPv4 字面量与协议前缀判定
//! - 请求主机提取
//! - 相对路径段折叠
//!
//! # 模块组织
//!
//! - `url` - URL 判定、主机提取、路径折叠等工具函数

pub mod url;

// Re-export commonly used items for convenience
pub use self::url::{
    collapse_parent_segments, has_scheme_prefix, http_host, is_ipv4_literal,
    PARENT_SEGMENT_PATTERN,
};
