/// True when the paragraph mentions any alias of the property, matched either
/// verbatim or case-insensitively. Aliases are used as stored, so padding
/// spaces act as word boundaries.
pub(crate) fn keyword_filter(aliases: &[String], text: &str) -> bool {
    let text_lower = text.to_lowercase();

    aliases
        .iter()
        .map(String::as_str)
        .filter(|alias| !alias.is_empty())
        .any(|alias| text.contains(alias) || text_lower.contains(&alias.to_lowercase()))
}
