//! Build metadata stamped in by `build.rs`.
//!
//! Builds outside a git checkout (crate tarballs, vendored sources) get no
//! `VERGEN_GIT_*` variables; every git field then reads `"unknown"`.

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Git branch at build time, or "unknown".
pub const GIT_BRANCH: &str = match option_env!("VERGEN_GIT_BRANCH") {
    Some(branch) => branch,
    None => "unknown",
};

/// Git commit SHA at build time, or "unknown".
pub const GIT_SHA: &str = match option_env!("VERGEN_GIT_SHA") {
    Some(sha) => sha,
    None => "unknown",
};

const SHORT_SHA_LEN: usize = 7;

/// Whether the working tree was dirty at build time.
pub fn git_dirty() -> bool {
    option_env!("VERGEN_GIT_DIRTY") == Some("true")
}

/// Version string used by the CLI and in logs:
/// `{version}+{branch}.{short-sha}`, with `.dirty` appended for dirty trees.
///
/// - `0.1.0+main.abc1234`
/// - `0.1.0+unknown.unknown` (no git metadata)
pub fn version_string() -> String {
    compose(PKG_VERSION, GIT_BRANCH, GIT_SHA, git_dirty())
}

fn compose(pkg: &str, branch: &str, sha: &str, dirty: bool) -> String {
    let short = sha.get(..SHORT_SHA_LEN).unwrap_or(sha);
    let suffix = if dirty { ".dirty" } else { "" };
    format!("{pkg}+{branch}.{short}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn without_git_metadata_reads_unknown() {
        assert_eq!(
            compose("0.1.0", "unknown", "unknown", false),
            "0.1.0+unknown.unknown"
        );
    }

    #[test]
    fn sha_is_shortened_and_dirty_marked() {
        assert_eq!(
            compose("1.2.3", "main", "abc1234def5678", true),
            "1.2.3+main.abc1234.dirty"
        );
    }

    #[test]
    fn short_sha_is_kept_whole() {
        assert_eq!(compose("0.1.0", "dev", "abc", false), "0.1.0+dev.abc");
    }

    #[test]
    fn build_version_starts_with_package_version() {
        let version = version_string();
        assert!(version.starts_with(&format!("{PKG_VERSION}+{GIT_BRANCH}.")));
    }
}
