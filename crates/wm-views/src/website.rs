//! Website context: host names to websites, and website menus.

use wm_storage::{MenuId, Records, WebsiteId};

/// Host name of a `Host` header value, without its port.
///
/// Bracketed IPv6 literals keep their brackets; a bare IPv6 literal (more
/// than one colon) is returned unchanged.
pub fn host_name(host_header: &str) -> &str {
    let host = host_header.trim();
    if host.starts_with('[') {
        return host.find(']').map_or(host, |end| &host[..=end]);
    }
    match host.split_once(':') {
        Some((name, port)) if !port.contains(':') => name,
        _ => host,
    }
}

/// Website serving `host_header`: the lowest-id website whose name matches
/// the host name, else `default`.
pub fn lookup_website(records: &dyn Records, host_header: &str, default: WebsiteId) -> WebsiteId {
    let name = host_name(host_header);
    match records.search_websites(name).first() {
        Some(id) => *id,
        None => {
            tracing::debug!(host = name, website_id = %default, "No website for host, using default");
            default
        }
    }
}

/// Root navigation menu of `website`.
pub fn website_menu(records: &dyn Records, website: WebsiteId) -> Option<MenuId> {
    records.root_menus(website).first().copied()
}
