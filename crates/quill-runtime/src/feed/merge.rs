#![forbid(unsafe_code)]

//! Interleaving of the two lists a feed page carries.

/// Interleave `primary` and `secondary` into one list.
///
/// Walks the longer list (`primary` on a tie) and, after each of its items,
/// emits the other list's item at the same index if there is one. Order
/// within either list is preserved.
///
/// ```
/// use quill_runtime::feed::merge;
///
/// assert_eq!(merge(vec!["s1", "s2", "s3"], vec!["r1"]), vec!["s1", "r1", "s2", "s3"]);
/// assert_eq!(merge(Vec::<&str>::new(), vec!["r1", "r2"]), vec!["r1", "r2"]);
/// ```
#[must_use]
pub fn merge<T>(primary: Vec<T>, secondary: Vec<T>) -> Vec<T> {
    let (longer, shorter) = if secondary.len() > primary.len() {
        (secondary, primary)
    } else {
        (primary, secondary)
    };
    let mut out = Vec::with_capacity(longer.len() + shorter.len());
    let mut shorter = shorter.into_iter();
    for item in longer {
        out.push(item);
        if let Some(paired) = shorter.next() {
            out.push(paired);
        }
    }
    out
}
