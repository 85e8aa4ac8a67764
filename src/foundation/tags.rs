//! Tag merging with an operator identity layer.

use std::collections::BTreeMap;

pub type TagSet = BTreeMap<String, String>;

/// Key under which the operator identity is recorded.
pub const IDENTITY_TAG_KEY: &str = "DEV_USER";

/// Copy of `tags` without empty values.
pub fn normalize(tags: Option<&TagSet>) -> TagSet {
    tags.map(|tags| {
        tags.iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    })
    .unwrap_or_default()
}

/// Merge layers in order; later layers win on key collision. Empty values are dropped.
pub fn merge_layers<'a, I>(layers: I) -> TagSet
where
    I: IntoIterator<Item = &'a TagSet>,
{
    let mut merged = TagSet::new();
    for layer in layers {
        for (key, value) in layer {
            if value.is_empty() {
                continue;
            }
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// `None` for an empty set.
pub fn non_empty(tags: TagSet) -> Option<TagSet> {
    if tags.is_empty() {
        None
    } else {
        Some(tags)
    }
}

/// Add the operator identity as the highest-precedence entry.
pub fn with_identity_tag(tags: TagSet, operator: Option<&str>) -> Option<TagSet> {
    let mut tags = normalize(Some(&tags));
    if let Some(operator) = operator.filter(|o| !o.is_empty()) {
        tags.insert(IDENTITY_TAG_KEY.to_string(), operator.to_string());
    }
    non_empty(tags)
}

/// Re-apply the identity tag over `tags` when updating a resource that
/// already carries `existing` tags.
///
/// With `only_if_present`, the operator identity replaces the tag only when
/// one was already recorded; otherwise the recorded value is kept.
pub fn apply_identity_tag(
    tags: Option<&TagSet>,
    existing: Option<&TagSet>,
    only_if_present: bool,
    operator: Option<&str>,
) -> Option<TagSet> {
    let mut base = normalize(tags);
    let base_identity = base.remove(IDENTITY_TAG_KEY);
    let existing_identity = normalize(existing).remove(IDENTITY_TAG_KEY);
    let had_identity = base_identity.is_some() || existing_identity.is_some();

    let identity = match operator.filter(|o| !o.is_empty()) {
        Some(operator) if !only_if_present || had_identity => Some(operator.to_string()),
        Some(_) => existing_identity,
        None => existing_identity.or(base_identity.filter(|_| !only_if_present)),
    };

    if let Some(identity) = identity {
        base.insert(IDENTITY_TAG_KEY.to_string(), identity);
    }
    non_empty(base)
}

/// Parse `key=value` pairs separated by commas. Blank entries are skipped.
pub fn parse_pairs(raw: &str) -> TagSet {
    raw.split(',')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let (key, value) = (key.trim(), value.trim());
            (!key.is_empty() && !value.is_empty()).then(|| (key.to_string(), value.to_string()))
        })
        .collect()
}
