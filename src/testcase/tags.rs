use std::collections::BTreeSet;

/// Tag that marks a test as hidden.
pub const HIDE_TAG: &str = "hide";
/// Short form of [`HIDE_TAG`].
pub const HIDE_TAG_SHORT: &str = ".";
/// Name prefix that marks a test as hidden.
pub const HIDDEN_NAME_PREFIX: &str = "./";

/// Normalized tag set. Ordered so that rendering is stable.
pub type TagSet = BTreeSet<String>;

/// Normalize a single tag: trimmed and lower-cased.
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// Split a description into its free text and the `[tag]` tokens embedded in it.
///
/// Tags are removed from the returned text and lower-cased. An opening
/// bracket without a matching close is kept as plain text.
pub fn extract_tags(description: &str) -> (String, TagSet) {
    let mut tags = TagSet::new();
    let mut text = String::with_capacity(description.len());
    let mut rest = description;

    while let Some(open) = rest.find('[') {
        let after = &rest[open + 1..];
        match after.find(']') {
            Some(close) => {
                text.push_str(&rest[..open]);
                let tag = normalize_tag(&after[..close]);
                if !tag.is_empty() {
                    tags.insert(tag);
                }
                rest = &after[close + 1..];
            }
            None => break,
        }
    }
    text.push_str(rest);

    (text.trim().to_owned(), tags)
}

/// Render a tag set as `[a][b]`, in set order.
pub fn render_tags(tags: &TagSet) -> String {
    tags.iter().map(|t| format!("[{t}]")).collect()
}

/// Whether a test with this name and tag set is hidden.
///
/// The one place hidden status is decided; callers read the stored flag.
pub fn is_hidden(name: &str, tags: &TagSet) -> bool {
    name.starts_with(HIDDEN_NAME_PREFIX) || tags.contains(HIDE_TAG) || tags.contains(HIDE_TAG_SHORT)
}
