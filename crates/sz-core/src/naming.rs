//! Collision-safe destination naming.
//!
//! Every output the core writes goes through [`allocate`], which never returns
//! a path that already exists. When the candidate is taken, a numeric
//! disambiguator is inserted before the extension chain:
//! `notes.txt` becomes `notes(1).txt`, `d.tar.sz` becomes `d(1).tar.sz`.

use crate::Result;
use crate::SzError;
use std::ffi::OsStr;
use std::ffi::OsString;
use std::path::Path;
use std::path::PathBuf;

/// Highest disambiguator probed before giving up.
pub const MAX_DISAMBIGUATOR: u64 = 20_091_110_230_000;

/// Extensions that always belong to the chain even though they are not a
/// registered media type.
const CHAIN_EXTENSIONS: &[&str] = &["tar", "sz", "tar.sz"];

/// Returns `true` if `ext` (without the leading dot) may be stripped into the
/// extension chain.
///
/// An extension with a registered media type belongs to the chain, so a
/// second `report.txt.sz` becomes `report(1).txt.sz` rather than
/// `report.txt(1).sz`.
fn is_chain_extension(ext: &str) -> bool {
    CHAIN_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext))
        || mime_guess::from_ext(ext).first_raw().is_some()
}

/// Splits a file name into `(base, extension_chain)`.
///
/// Trailing extensions are stripped one at a time while each is a known media
/// type or one of `.tar`/`.sz`; the first unrecognized extension stops the
/// walk. A leading dot (hidden file) never counts as an extension.
///
/// # Examples
///
/// ```
/// use sz_core::naming::split_extension;
///
/// assert_eq!(split_extension("d.tar.sz"), ("d".to_string(), ".tar.sz".to_string()));
/// assert_eq!(split_extension("notes.txt"), ("notes".to_string(), ".txt".to_string()));
/// assert_eq!(split_extension("build.v2"), ("build.v2".to_string(), String::new()));
/// ```
#[must_use]
pub fn split_extension(file_name: &str) -> (String, String) {
    let mut base = file_name;
    let mut chain_start = file_name.len();

    while let Some(dot) = base.rfind('.') {
        if dot == 0 {
            break;
        }
        let ext = &base[dot + 1..];
        if ext.is_empty() || !is_chain_extension(ext) {
            break;
        }
        chain_start = dot;
        base = &base[..dot];
    }

    (
        file_name[..chain_start].to_string(),
        file_name[chain_start..].to_string(),
    )
}

/// Builds `base(n)chain` next to the candidate.
fn numbered(parent: Option<&Path>, base: &OsStr, chain: &OsStr, n: u64) -> PathBuf {
    let mut name = OsString::from(base);
    name.push(format!("({n})"));
    name.push(chain);
    match parent {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

/// Returns `true` if anything (including a dangling symlink) occupies `path`.
fn occupied(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

/// Returns a destination path that does not exist yet.
///
/// If `candidate` is free it is returned unchanged; otherwise `base(1)chain`,
/// `base(2)chain`, ... are probed in order. The probe creates nothing, so two
/// consecutive calls for the same candidate return the same path.
///
/// This is a check-then-create probe; callers open the result with
/// `create_new` so a concurrent writer that wins the race produces an error
/// instead of an overwrite.
///
/// # Errors
///
/// Returns [`SzError::NameExhausted`] if every disambiguator up to
/// [`MAX_DISAMBIGUATOR`] is taken.
///
/// # Examples
///
/// ```no_run
/// use sz_core::naming::allocate;
/// use std::path::Path;
///
/// let dest = allocate(Path::new("backup.tar.sz"))?;
/// assert!(!dest.exists());
/// # Ok::<(), sz_core::SzError>(())
/// ```
pub fn allocate(candidate: &Path) -> Result<PathBuf> {
    allocate_with_limit(candidate, MAX_DISAMBIGUATOR)
}

/// [`allocate`] with an explicit probe limit.
pub fn allocate_with_limit(candidate: &Path, limit: u64) -> Result<PathBuf> {
    if !occupied(candidate) {
        return Ok(candidate.to_path_buf());
    }

    let file_name = candidate
        .file_name()
        .ok_or_else(|| SzError::NameExhausted {
            path: candidate.to_path_buf(),
        })?
        .to_string_lossy()
        .into_owned();
    let (base, chain) = split_extension(&file_name);
    let parent = candidate.parent().filter(|p| !p.as_os_str().is_empty());

    for n in 1..=limit {
        let probe = numbered(parent, OsStr::new(&base), OsStr::new(&chain), n);
        if !occupied(&probe) {
            return Ok(probe);
        }
    }

    Err(SzError::NameExhausted {
        path: candidate.to_path_buf(),
    })
}

/// Appends a suffix to the file name of `path` (`a/b.txt` + `.sz` ->
/// `a/b.txt.sz`).
#[must_use]
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn split(name: &str) -> (String, String) {
        split_extension(name)
    }

    #[test]
    fn test_split_compound_chain() {
        assert_eq!(split("d.tar.sz"), ("d".into(), ".tar.sz".into()));
        assert_eq!(split("d.tar"), ("d".into(), ".tar".into()));
        assert_eq!(split("notes.txt.sz"), ("notes".into(), ".txt.sz".into()));
    }

    #[test]
    fn test_split_stops_at_unknown_extension() {
        assert_eq!(split("app.v2.sz"), ("app.v2".into(), ".sz".into()));
        assert_eq!(split("README"), ("README".into(), String::new()));
        assert_eq!(split("data.qqz"), ("data.qqz".into(), String::new()));
    }

    #[test]
    fn test_split_uses_media_type_table() {
        assert_eq!(split("song.m4a.sz"), ("song".into(), ".m4a.sz".into()));
        assert_eq!(split("blob.bin"), ("blob".into(), ".bin".into()));
        assert_eq!(split("main.py"), ("main".into(), ".py".into()));
    }

    #[test]
    fn test_split_hidden_file() {
        assert_eq!(split(".bashrc"), (".bashrc".into(), String::new()));
        assert_eq!(split(".notes.txt"), (".notes".into(), ".txt".into()));
    }

    #[test]
    fn test_split_is_case_insensitive() {
        assert_eq!(split("IMG.JPG"), ("IMG".into(), ".JPG".into()));
    }

    #[test]
    fn test_split_trailing_dot() {
        assert_eq!(split("weird."), ("weird.".into(), String::new()));
    }

    #[test]
    fn test_allocate_free_candidate_unchanged() {
        let temp = TempDir::new().unwrap();
        let candidate = temp.path().join("fresh.txt");
        assert_eq!(allocate(&candidate).unwrap(), candidate);
    }

    #[test]
    fn test_allocate_inserts_before_chain() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("d.tar.sz"), "x").unwrap();

        let allocated = allocate(&temp.path().join("d.tar.sz")).unwrap();
        assert_eq!(allocated, temp.path().join("d(1).tar.sz"));
    }

    #[test]
    fn test_allocate_probes_in_order() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "x").unwrap();
        fs::write(temp.path().join("a(1).txt"), "x").unwrap();
        fs::write(temp.path().join("a(2).txt"), "x").unwrap();

        let allocated = allocate(&temp.path().join("a.txt")).unwrap();
        assert_eq!(allocated, temp.path().join("a(3).txt"));
    }

    #[test]
    fn test_allocate_is_idempotent_probe() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "x").unwrap();

        let first = allocate(&temp.path().join("a.txt")).unwrap();
        let second = allocate(&temp.path().join("a.txt")).unwrap();
        assert_eq!(first, second);
        assert!(!first.exists());
    }

    #[test]
    fn test_allocate_directory_without_extension() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("d")).unwrap();

        let allocated = allocate(&temp.path().join("d")).unwrap();
        assert_eq!(allocated, temp.path().join("d(1)"));
    }

    #[cfg(unix)]
    #[test]
    fn test_allocate_treats_dangling_symlink_as_taken() {
        let temp = TempDir::new().unwrap();
        std::os::unix::fs::symlink("missing", temp.path().join("link.txt")).unwrap();

        let allocated = allocate(&temp.path().join("link.txt")).unwrap();
        assert_eq!(allocated, temp.path().join("link(1).txt"));
    }

    #[test]
    fn test_allocate_exhaustion_is_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "x").unwrap();
        fs::write(temp.path().join("a(1).txt"), "x").unwrap();

        let err = allocate_with_limit(&temp.path().join("a.txt"), 1).unwrap_err();
        assert!(matches!(err, SzError::NameExhausted { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_with_suffix() {
        assert_eq!(
            with_suffix(Path::new("dir/file.txt"), ".sz"),
            PathBuf::from("dir/file.txt.sz")
        );
    }
}
