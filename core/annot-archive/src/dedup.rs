//! Collision-free renaming.

use annot_types::split_extension;
use std::collections::HashSet;

/// Returns `candidate` if unused, otherwise the first free
/// `"{stem} ({n}){ext}"` for n = 1, 2, ….
///
/// The extension (everything from the last `.`) is preserved. `used` is
/// only read; batch callers record each result themselves, or use
/// [`NameScope`].
pub fn dedup_name(candidate: &str, used: &HashSet<String>) -> String {
    if !used.contains(candidate) {
        return candidate.to_string();
    }

    let (stem, ext) = split_extension(candidate);
    let mut n: u64 = 1;
    loop {
        let probe = format!("{stem} ({n}){ext}");
        if !used.contains(&probe) {
            return probe;
        }
        n += 1;
    }
}

/// A running set of names already taken in one scope.
#[derive(Debug, Clone, Default)]
pub struct NameScope {
    used: HashSet<String>,
}

impl NameScope {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            used: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Deduplicates `candidate` against the scope and reserves the result.
    pub fn claim(&mut self, candidate: &str) -> String {
        let name = dedup_name(candidate, &self.used);
        self.used.insert(name.clone());
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn used(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn unused_name_is_unchanged() {
        assert_eq!(dedup_name("report.pdf", &used(&["other.pdf"])), "report.pdf");
    }

    #[test]
    fn first_collision_gets_one() {
        assert_eq!(dedup_name("report.pdf", &used(&["report.pdf"])), "report (1).pdf");
    }

    #[test]
    fn skips_taken_suffixes() {
        let taken = used(&["report.pdf", "report (1).pdf", "report (2).pdf"]);
        assert_eq!(dedup_name("report.pdf", &taken), "report (3).pdf");
    }

    #[test]
    fn no_extension() {
        assert_eq!(dedup_name("Contracts", &used(&["Contracts"])), "Contracts (1)");
    }

    #[test]
    fn dotfile_is_all_stem() {
        assert_eq!(dedup_name(".env", &used(&[".env"])), ".env (1)");
    }

    #[test]
    fn multi_dot_suffixes_before_last_extension() {
        assert_eq!(
            dedup_name("data.tar.gz", &used(&["data.tar.gz"])),
            "data.tar (1).gz"
        );
    }

    #[test]
    fn scope_claims_are_remembered() {
        let mut scope = NameScope::new(["a.txt"]);
        assert_eq!(scope.claim("a.txt"), "a (1).txt");
        assert_eq!(scope.claim("a.txt"), "a (2).txt");
        assert_eq!(scope.claim("b.txt"), "b.txt");
        assert_eq!(scope.claim("a (2).txt"), "a (2) (1).txt");
    }
}
