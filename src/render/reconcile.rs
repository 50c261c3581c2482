use indexmap::IndexSet;

/// Outcome of a keyed join between the previous and the next key sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Keys only in `next`, in `next` order.
    pub enter: Vec<String>,
    /// Keys in both, in `next` order.
    pub update: Vec<String>,
    /// Keys only in `prev`, in `prev` order.
    pub exit: Vec<String>,
}

/// Keyed join. Duplicate keys in `next` bind once, first occurrence wins.
#[must_use]
pub fn reconcile<'a, P, N>(prev_keys: P, next_keys: N) -> Reconciliation
where
    P: IntoIterator<Item = &'a str>,
    N: IntoIterator<Item = &'a str>,
{
    let prev: IndexSet<&str> = prev_keys.into_iter().collect();
    let next: IndexSet<&str> = next_keys.into_iter().collect();

    let mut out = Reconciliation::default();
    for key in &next {
        if prev.contains(key) {
            out.update.push((*key).to_owned());
        } else {
            out.enter.push((*key).to_owned());
        }
    }
    out.exit = prev
        .iter()
        .filter(|key| !next.contains(*key))
        .map(|key| (*key).to_owned())
        .collect();
    out
}

#[cfg(test)]
mod tests {
    use super::reconcile;

    #[test]
    fn splits_keys_into_enter_update_exit() {
        let out = reconcile(["a", "b", "c"], ["c", "d", "a", "d"]);
        assert_eq!(out.enter, vec!["d"]);
        assert_eq!(out.update, vec!["c", "a"]);
        assert_eq!(out.exit, vec!["b"]);
    }
}
