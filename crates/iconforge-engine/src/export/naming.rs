//! Output filename derivation.

use crate::object::ObjectId;

/// Derives the output filename for an object: `<namespace>_<name>.png`,
/// both parts sanitized.
pub fn file_name(id: &ObjectId) -> String {
    format!("{}_{}.png", sanitize(&id.namespace), sanitize(&id.name))
}

/// Restricts one id part to `[a-z0-9._-]`.
///
/// Uppercase is folded to lowercase; anything else — path separators
/// included — becomes `_`. An empty part sanitizes to `_` so the result is
/// never empty.
pub fn sanitize(part: &str) -> String {
    let mut out: String = part
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if out.is_empty() {
        out.push('_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_id() {
        let id = ObjectId::new("minecraft", "stone");
        assert_eq!(file_name(&id), "minecraft_stone.png");
    }

    #[test]
    fn uppercase_is_folded() {
        assert_eq!(sanitize("IconForge"), "iconforge");
    }

    #[test]
    fn path_separators_are_neutralized() {
        // Dots are allowed; separators are not, so no traversal survives.
        assert_eq!(sanitize("../etc/passwd"), ".._etc_passwd");
        assert_eq!(sanitize(r"a\b"), "a_b");
    }

    #[test]
    fn unicode_and_spaces_become_underscores() {
        assert_eq!(sanitize("gémme bleue"), "g_mme_bleue");
    }

    #[test]
    fn allowed_punctuation_survives() {
        assert_eq!(sanitize("oak_log.top-half"), "oak_log.top-half");
    }

    #[test]
    fn empty_part_is_never_empty() {
        assert_eq!(sanitize(""), "_");
        let id = ObjectId::new("", "");
        assert_eq!(file_name(&id), "___.png");
    }
}
