//! The system shared-library cache (`ldconfig -p`).

use std::path::PathBuf;

use regex::Regex;

/// One line of `ldconfig -p` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// e.g. `libssl.so.3`
    pub soname: String,
    /// The parenthesized tag list, e.g. `libc6,x86-64`.
    pub flags: String,
    pub path: PathBuf,
}

/// Parse `ldconfig -p` output.
///
/// Lines look like `\tlibm.so.6 (libc6,x86-64, OS ABI: Linux 3.2.0) => /lib/x86_64-linux-gnu/libm.so.6`.
/// The header line and anything without `=>` are ignored.
pub fn parse(output: &str) -> Vec<CacheEntry> {
    output
        .lines()
        .filter_map(|line| {
            let (left, path) = line.split_once("=>")?;
            let left = left.trim();
            let path = path.trim();
            if left.is_empty() || path.is_empty() {
                return None;
            }

            let (soname, flags) = match left.split_once(' ') {
                Some((soname, rest)) => (
                    soname,
                    rest.trim().trim_start_matches('(').trim_end_matches(')'),
                ),
                None => (left, ""),
            };

            Some(CacheEntry {
                soname: soname.to_string(),
                flags: flags.to_string(),
                path: PathBuf::from(path),
            })
        })
        .collect()
}

/// Matcher for sonames belonging to exactly one library.
///
/// Accepts `lib<name>.so`, `lib<name>.so.6`, `lib<name>.so.1.2.3` and
/// `lib<name>3.so`. Rejects overlapping names such as `libssl3-custom.so`
/// or `libsslx.so` when looking for `ssl`.
#[derive(Debug)]
pub struct SonameMatcher {
    pattern: Option<Regex>,
}

impl SonameMatcher {
    pub fn new(name: &str) -> Self {
        let pattern = format!(
            r"^lib{}(?:[0-9][0-9.]*)?\.so(?:\.[0-9]+)*$",
            regex::escape(name)
        );
        SonameMatcher {
            pattern: Regex::new(&pattern).ok(),
        }
    }

    pub fn matches(&self, soname: &str) -> bool {
        self.pattern.as_ref().is_some_and(|p| p.is_match(soname))
    }
}

/// Architecture tag ldconfig prints for libraries of the host arch.
pub fn host_arch_tag() -> Option<&'static str> {
    if cfg!(target_arch = "x86_64") {
        Some("x86-64")
    } else if cfg!(target_arch = "aarch64") {
        Some("AArch64")
    } else {
        None
    }
}

/// Entries for `name`, host-arch entries first, cache order otherwise.
pub fn candidates<'a>(entries: &'a [CacheEntry], name: &str) -> Vec<&'a CacheEntry> {
    let matcher = SonameMatcher::new(name);
    let mut found: Vec<&CacheEntry> = entries
        .iter()
        .filter(|e| matcher.matches(&e.soname))
        .collect();

    if let Some(tag) = host_arch_tag() {
        // Stable, so cache order is kept within each group.
        found.sort_by_key(|e| !e.flags.contains(tag));
    }
    found
}
