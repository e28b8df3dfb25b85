use std::borrow::Cow;
use std::error::Error;
use std::fmt;

use url::Url;

use crate::parsers::css::{rewrite_addresses, rewrite_relative_urls};
use crate::utils::url::http_host;

/// Represents errors that can occur during rehost processing
///
/// This error type encapsulates all possible errors that can occur
/// when feeding an asset through the rehost library, which in practice
/// means I/O and argument problems in the calling layer. The rewriting
/// core itself never fails: misconfiguration degrades to a no-op.
#[derive(Debug)]
pub struct RehostError {
    details: String,
}

impl RehostError {
    /// Creates a new RehostError with the given message
    ///
    /// # Arguments
    ///
    /// * `msg` - The error message describing what went wrong
    ///
    /// # Returns
    ///
    /// A new RehostError instance
    pub fn new(msg: &str) -> RehostError {
        RehostError {
            details: msg.to_string(),
        }
    }
}

impl fmt::Display for RehostError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.details)
    }
}

impl Error for RehostError {
    fn description(&self) -> &str {
        &self.details
    }
}

/// Address matching modes for url() rewriting
///
/// Selects which IPv4-hosted url() occurrences get rewritten. The mode is
/// an explicit configuration choice; exactly one routine runs per asset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RewriteMode {
    /// Only rewrite occurrences of the configured server address (default)
    #[default]
    ServerAddress,
    /// Rewrite every occurrence with an IPv4-literal host, whatever its value
    AnyAddress,
}

/// Configuration for a single rewriting context
///
/// This struct contains the resolved target scheme and host plus the
/// matching policy. It is resolved once per processing context (typically
/// once per inbound request) and passed into every rewrite call, so the
/// core has no dependency on any process-wide "current request" state.
#[derive(Clone, Debug, Default)]
pub struct RewriteRule {
    /// The scheme to rewrite URLs to
    pub scheme: String,
    /// The host name to rewrite URLs to; empty disables all rewriting
    pub host: String,
    /// Which url() occurrences qualify for rewriting
    pub mode: RewriteMode,
    /// The current server's IPv4 address, only used in server-address mode
    pub server_address: String,
}

impl RewriteRule {
    pub fn new(scheme: &str, host: &str) -> RewriteRule {
        RewriteRule {
            scheme: scheme.to_string(),
            host: host.to_string(),
            ..Default::default()
        }
    }

    /// Resolves the target scheme and host for a processing context
    ///
    /// Prefers the explicitly configured host when non-empty, otherwise
    /// falls back to the host of the inbound request URL (including a
    /// non-default port). The scheme is taken from the request URL when
    /// available, "https" otherwise. When neither source yields a host the
    /// resulting rule disables rewriting rather than producing malformed
    /// URLs.
    ///
    /// # Arguments
    ///
    /// * `configured_host` - The canonical public host from configuration, if any
    /// * `request_url` - The URL of the current inbound request, if any
    ///
    /// # Returns
    ///
    /// A rule with scheme and host filled in; mode and server address keep
    /// their defaults and can be set through the builder methods.
    pub fn resolve(configured_host: Option<&str>, request_url: Option<&Url>) -> RewriteRule {
        let host = match configured_host {
            Some(configured) if !configured.is_empty() => configured.to_string(),
            _ => request_url.map(http_host).unwrap_or_default(),
        };

        let scheme = match request_url {
            Some(request) => request.scheme().to_string(),
            None => "https".to_string(),
        };

        RewriteRule {
            scheme,
            host,
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: RewriteMode) -> RewriteRule {
        self.mode = mode;
        self
    }

    pub fn with_server_address(mut self, server_address: &str) -> RewriteRule {
        self.server_address = server_address.to_string();
        self
    }
}

/// Outcome of one rewrite pass over one asset's CSS content
///
/// Fully derived per call; carries no identity beyond the call. When no
/// replacement happened the content is the borrowed input, which callers
/// can rely on to skip "content changed" side effects.
#[derive(Debug)]
pub struct RewriteResult<'a> {
    /// The CSS content, borrowed and untouched unless `count > 0`
    pub content: Cow<'a, str>,
    /// Distinct matched IPv4 addresses in first-seen order
    pub addresses: Vec<String>,
    /// Total number of url() occurrences replaced
    pub count: usize,
}

impl<'a> RewriteResult<'a> {
    /// Creates a result representing "no replacements performed"
    pub fn unchanged(content: &'a str) -> RewriteResult<'a> {
        RewriteResult {
            content: Cow::Borrowed(content),
            addresses: Vec::new(),
            count: 0,
        }
    }

    pub fn is_modified(&self) -> bool {
        self.count > 0
    }
}

/// Rewrites IPv4-hosted url() occurrences in one asset's CSS content
///
/// This is the per-asset entry point the aggregation pipeline calls. The
/// heavy lifting happens in [`crate::parsers::css::rewrite_addresses`];
/// this wrapper adds the replacement summary logging the pipeline expects,
/// and skips it entirely when nothing was replaced.
///
/// # Arguments
///
/// * `content` - The full CSS content for the asset
/// * `asset` - Identifier or path of the asset, used only for logging
/// * `rule` - The resolved rewriting configuration
///
/// # Returns
///
/// The rewrite result; `content` is borrowed input when `count == 0`.
pub fn rehost_css<'a>(content: &'a str, asset: &str, rule: &RewriteRule) -> RewriteResult<'a> {
    let result = rewrite_addresses(content, rule);

    if !result.is_modified() {
        return result;
    }

    match rule.mode {
        RewriteMode::ServerAddress => {
            tracing::debug!(
                "Replaced {} instance(s) of the server address ({}) with the host name ({}) in asset {}",
                result.count,
                rule.server_address,
                rule.host,
                asset
            );
        }
        RewriteMode::AnyAddress => {
            tracing::info!(
                "Replaced {} instance(s) of {} IP address(es) ({}) with the host name ({}) in asset {}",
                result.count,
                result.addresses.len(),
                result.addresses.join(", "),
                rule.host,
                asset
            );
        }
    }

    result
}

/// Anchors relative url() paths in one asset's CSS content
///
/// Sibling entry point for aggregators that resolve relative url()
/// references against the CSS file's own directory: prefixes each relative
/// path with `base_path`, collapses `parent/../` segments, and emits an
/// absolute URL on the rule's scheme and host. External, absolute-path and
/// fragment references are left alone.
pub fn rehost_css_relative<'a>(
    content: &'a str,
    asset: &str,
    base_path: &str,
    rule: &RewriteRule,
) -> RewriteResult<'a> {
    let result = rewrite_relative_urls(content, base_path, rule);

    if result.is_modified() {
        tracing::debug!(
            "Anchored {} relative url() path(s) at {}://{}/ in asset {}",
            result.count,
            rule.scheme,
            rule.host,
            asset
        );
    }

    result
}
