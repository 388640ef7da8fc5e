//! Purpose: Schema-aware conveniences layered on decoded reply trees.
//! Exports: `DomainInfo`, `domain_info`, `domain_list`, `indexed_values`.
//! Role: Optional shaping for known commands; the generic decoder stays schema-free.
//! Invariants: Numbered siblings become ordered lists only here, never in core.

use super::remote::RemoteClient;
use super::session::Session;
use crate::core::error::Error;
use crate::core::value::ResultTree;
use serde::Serialize;
use time::Date;
use time::macros::format_description;

type ApiResult<T> = Result<T, Error>;

/// Shaped result of `query-domain-info`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct DomainInfo {
    pub name: String,
    pub status: Option<String>,
    pub expires: Option<String>,
    pub nameservers: Vec<String>,
}

impl DomainInfo {
    /// Expiry as a calendar date, when the endpoint sent `YYYY-MM-DD`.
    pub fn expires_date(&self) -> Option<Date> {
        let format = format_description!("[year]-[month]-[day]");
        Date::parse(self.expires.as_deref()?, &format).ok()
    }
}

/// Collect leaf values of children whose keys are base-10 numerals, in
/// numeric order. Non-numeric keys and subtree children are ignored.
pub fn indexed_values(tree: &ResultTree) -> Vec<&str> {
    let mut entries: Vec<(u64, &str)> = tree
        .iter()
        .filter_map(|(key, node)| Some((key.parse().ok()?, node.as_leaf()?)))
        .collect();
    entries.sort_by_key(|(index, _)| *index);
    entries.into_iter().map(|(_, value)| value).collect()
}

/// Issue `query-domain-info` and shape the decoded tree. Fields the
/// endpoint omits stay unset; nameservers come from `domain.ns.<n>`.
pub fn domain_info(
    client: &RemoteClient,
    session: &mut Session,
    name: &str,
) -> ApiResult<DomainInfo> {
    let reply = client.call(session, "query-domain-info", &[("domain", name)])?;
    let tree = reply.decode_body();
    let domain = tree.subtree("domain");
    let leaf = |key: &str| {
        domain
            .and_then(|d| d.leaf(key))
            .map(str::to_string)
    };
    let nameservers = domain
        .and_then(|d| d.subtree("ns"))
        .map(indexed_values)
        .unwrap_or_default()
        .into_iter()
        .map(str::to_string)
        .collect();
    Ok(DomainInfo {
        name: leaf("name").unwrap_or_else(|| name.to_string()),
        status: leaf("status"),
        expires: leaf("expires"),
        nameservers,
    })
}

/// Issue `query-domain-list` and shape `domain.<n>` into an ordered list.
pub fn domain_list(client: &RemoteClient, session: &mut Session) -> ApiResult<Vec<String>> {
    let reply = client.call(session, "query-domain-list", &[])?;
    let tree = reply.decode_body();
    Ok(tree
        .subtree("domain")
        .map(indexed_values)
        .unwrap_or_default()
        .into_iter()
        .map(str::to_string)
        .collect())
}
