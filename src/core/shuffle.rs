use std::collections::BTreeMap;

/// Groups map output so each key sees the complete multiset of its values.
///
/// Keys come out in sorted order; the order of values within a key is
/// unspecified.
pub fn group_by_key<K: Ord, V>(pairs: impl IntoIterator<Item = (K, V)>) -> BTreeMap<K, Vec<V>> {
    let mut grouped: BTreeMap<K, Vec<V>> = BTreeMap::new();
    for (key, value) in pairs {
        grouped.entry(key).or_default().push(value);
    }
    grouped
}

/// Splits `items` into at most `parts` contiguous, non-empty chunks of near-equal size.
pub fn partition<T>(items: Vec<T>, parts: usize) -> Vec<Vec<T>> {
    if items.is_empty() {
        return Vec::new();
    }

    let parts = parts.clamp(1, items.len());
    let base = items.len() / parts;
    let extra = items.len() % parts;

    let mut chunks = Vec::with_capacity(parts);
    let mut iter = items.into_iter();
    for index in 0..parts {
        let size = base + usize::from(index < extra);
        chunks.push(iter.by_ref().take(size).collect());
    }
    chunks
}
