#![forbid(unsafe_code)]

use std::collections::HashSet;

/// Replaces characters that are not portable in file names with `_`.
/// Lump names such as `VILE\` or `STCFN063` map to something every
/// filesystem accepts.
pub fn sanitize_file_name(name: &str) -> String {
    let out: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if out.is_empty() || out.chars().all(|c| c == '.') {
        return "_".repeat(out.len().max(1));
    }
    out
}

/// File names handed out during one export call. Comparison ignores ASCII
/// case so exports stay valid on case-insensitive filesystems.
#[derive(Debug, Default)]
pub struct NameRegistry {
    taken: HashSet<String>,
}

impl NameRegistry {
    pub fn with_reserved(reserved: &[&str]) -> Self {
        Self {
            taken: reserved.iter().map(|r| r.to_ascii_lowercase()).collect(),
        }
    }

    /// Returns `base`, or `base_N` with the smallest free `N` starting at 0.
    pub fn claim(&mut self, base: &str) -> String {
        if self.taken.insert(base.to_ascii_lowercase()) {
            return base.to_string();
        }
        let mut n = 0usize;
        loop {
            let candidate = format!("{base}_{n}");
            if self.taken.insert(candidate.to_ascii_lowercase()) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn illegal_characters_become_underscores() {
        assert_eq!(sanitize_file_name("VILE\\"), "VILE_");
        assert_eq!(sanitize_file_name("A*B?C"), "A_B_C");
        assert_eq!(sanitize_file_name("VILE[1"), "VILE[1");
        assert_eq!(sanitize_file_name(".."), "__");
        assert_eq!(sanitize_file_name(""), "_");
    }

    #[test]
    fn collisions_get_numeric_suffixes() {
        let mut names = NameRegistry::with_reserved(&["MEDIA"]);
        assert_eq!(names.claim("THINGS"), "THINGS");
        assert_eq!(names.claim("THINGS"), "THINGS_0");
        assert_eq!(names.claim("things"), "things_1");
        assert_eq!(names.claim("media"), "media_0");
    }
}
