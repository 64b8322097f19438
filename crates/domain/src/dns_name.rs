use std::sync::Arc;

/// Normalizes a question or match domain to its lowercase fully-qualified
/// form, e.g. `MyCompany.LOCAL` and `mycompany.local.` both become
/// `mycompany.local.`.
pub fn normalize_fqdn(domain: &str) -> Arc<str> {
    let lower = domain.to_lowercase();
    if lower.ends_with('.') {
        Arc::from(lower)
    } else {
        Arc::from(format!("{}.", lower))
    }
}

/// Iterates a normalized FQDN and each of its parent suffixes, most specific
/// first: `a.b.c.` yields `a.b.c.`, `b.c.`, `c.`.
pub fn fqdn_suffixes(fqdn: &str) -> impl Iterator<Item = &str> {
    let mut next = Some(fqdn);
    std::iter::from_fn(move || {
        let current = next?;
        next = current
            .split_once('.')
            .map(|(_, rest)| rest)
            .filter(|rest| !rest.is_empty());
        Some(current)
    })
}
