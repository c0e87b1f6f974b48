//! Integration tests for sz-core.
//!
//! These tests run whole pipelines against a real filesystem.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::Path;
use sz_core::NoopProgress;
use sz_core::Outcome;
use sz_core::ProgressSink;
use sz_core::ProgressUnit;
use sz_core::Session;
use sz_core::SzConfig;
use sz_core::SzError;
use sz_core::analyze;
use sz_core::codec;
use sz_core::creation;
use sz_core::formats::is_compressed_archive;
use sz_core::formats::is_tar_stream;
use tempfile::TempDir;

fn run<T>(op: impl FnOnce(&mut Session<'_>) -> sz_core::Result<T>) -> sz_core::Result<T> {
    let config = SzConfig::default();
    let mut progress = NoopProgress;
    let mut session = Session::new(&config, &mut progress);
    op(&mut session)
}

fn read_members(tar: &Path) -> Vec<(String, tar::EntryType, u64)> {
    let mut archive = tar::Archive::new(fs::File::open(tar).unwrap());
    archive
        .entries()
        .unwrap()
        .map(|entry| {
            let entry = entry.unwrap();
            (
                entry.path().unwrap().to_string_lossy().into_owned(),
                entry.header().entry_type(),
                entry.header().size().unwrap(),
            )
        })
        .collect()
}

#[test]
fn test_file_round_trip() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("data.bin");
    let content: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    fs::write(&input, &content).unwrap();

    let compressed = run(|s| codec::compress(&input, s)).unwrap();
    assert_eq!(compressed.path, temp.path().join("data.bin.sz"));
    assert!(is_compressed_archive(&compressed.file));

    fs::remove_file(&input).unwrap();
    let restored = run(|s| codec::decompress(&compressed.path, s)).unwrap();
    assert_eq!(restored.path, input);
    assert_eq!(fs::read(&input).unwrap(), content);
}

#[test]
fn test_empty_file_round_trip() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("empty");
    fs::write(&input, b"").unwrap();

    let compressed = run(|s| codec::compress(&input, s)).unwrap();
    fs::remove_file(&input).unwrap();
    let restored = run(|s| codec::decompress(&compressed.path, s)).unwrap();

    assert_eq!(restored.path, input);
    assert!(fs::read(&input).unwrap().is_empty());
}

#[test]
fn test_outputs_never_overwrite() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("notes.txt");
    fs::write(&input, b"one").unwrap();
    fs::write(temp.path().join("notes.txt.sz"), b"occupied").unwrap();

    let first = run(|s| analyze(&input, s)).unwrap();
    let second = run(|s| analyze(&input, s)).unwrap();

    assert_eq!(first.output(), temp.path().join("notes(1).txt.sz"));
    assert_eq!(second.output(), temp.path().join("notes(2).txt.sz"));
    assert_eq!(
        fs::read(temp.path().join("notes.txt.sz")).unwrap(),
        b"occupied"
    );
}

#[test]
fn test_decompress_restores_next_to_existing_original() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("notes.txt");
    fs::write(&input, b"content").unwrap();

    let compressed = run(|s| analyze(&input, s)).unwrap();
    let restored = run(|s| analyze(compressed.output(), s)).unwrap();

    assert_eq!(restored.output(), temp.path().join("notes(1).txt"));
    assert_eq!(fs::read(restored.output()).unwrap(), b"content");
}

#[test]
fn test_directory_round_trip_preserves_tree() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("project");
    fs::create_dir_all(dir.join("src/nested")).unwrap();
    fs::create_dir(dir.join("empty")).unwrap();
    fs::write(dir.join("README"), b"readme").unwrap();
    fs::write(dir.join("src/main.rs"), b"fn main() {}").unwrap();
    fs::write(dir.join("src/nested/data.bin"), vec![7u8; 100_000]).unwrap();

    let archived = run(|s| analyze(&dir, s)).unwrap();
    assert_eq!(archived.output(), temp.path().join("project.tar.sz"));
    assert!(!temp.path().join("project.tar").exists());

    fs::remove_dir_all(&dir).unwrap();
    let extracted = run(|s| analyze(archived.output(), s)).unwrap();
    assert_eq!(extracted.output(), dir);

    assert_eq!(fs::read(dir.join("README")).unwrap(), b"readme");
    assert_eq!(fs::read(dir.join("src/main.rs")).unwrap(), b"fn main() {}");
    assert_eq!(
        fs::read(dir.join("src/nested/data.bin")).unwrap(),
        vec![7u8; 100_000]
    );
    assert!(dir.join("empty").is_dir());
    assert!(!temp.path().join("project.tar").exists());
}

#[test]
fn test_extraction_beside_existing_directory_renames_root() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("d");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("a.txt"), b"hi").unwrap();

    let archived = run(|s| analyze(&dir, s)).unwrap();
    let extracted = run(|s| analyze(archived.output(), s)).unwrap();

    let renamed = temp.path().join("d(1)");
    assert_eq!(extracted.output(), renamed);
    assert_eq!(fs::read(renamed.join("a.txt")).unwrap(), b"hi");
    assert_eq!(fs::read(dir.join("a.txt")).unwrap(), b"hi");
}

#[test]
fn test_corrupt_stream_is_reported() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("broken.sz");
    let mut bytes = sz_core::formats::detect::SNAPPY_SIGNATURE.to_vec();
    bytes.extend_from_slice(&[0x01, 0x10, 0x00, 0x00, 0xde, 0xad, 0xbe, 0xef]);
    fs::write(&input, bytes).unwrap();

    let err = run(|s| analyze(&input, s)).unwrap_err();
    assert!(err.is_corrupt(), "unexpected error: {err}");
}

#[cfg(unix)]
#[test]
fn test_hardlink_dedup() {
    use std::os::unix::fs::MetadataExt;

    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("links");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("a"), b"shared body").unwrap();
    fs::hard_link(dir.join("a"), dir.join("b")).unwrap();
    fs::hard_link(dir.join("a"), dir.join("c")).unwrap();
    assert_eq!(fs::metadata(dir.join("a")).unwrap().nlink(), 3);

    let (tar, report) = run(|s| creation::build(&dir, s)).unwrap();
    assert!(is_tar_stream(&tar.file));
    assert_eq!(report.files_added, 1);
    assert_eq!(report.hardlinks_added, 2);

    let members = read_members(&tar.path);
    let regular: Vec<_> = members
        .iter()
        .filter(|(_, kind, _)| *kind == tar::EntryType::Regular)
        .collect();
    let links: Vec<_> = members
        .iter()
        .filter(|(_, kind, _)| *kind == tar::EntryType::Link)
        .collect();
    assert_eq!(regular.len(), 1);
    assert_eq!(regular[0].0, "links/a");
    assert_eq!(regular[0].2, 11);
    assert_eq!(
        links.iter().map(|(name, _, size)| (name.as_str(), *size)).collect::<Vec<_>>(),
        vec![("links/b", 0), ("links/c", 0)]
    );
}

#[cfg(unix)]
#[test]
fn test_concrete_hardlink_scenario() {
    use std::os::unix::fs::MetadataExt;

    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("d");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("a.txt"), b"hi").unwrap();
    fs::hard_link(dir.join("a.txt"), dir.join("b.txt")).unwrap();

    let (tar, _) = run(|s| creation::build(&dir, s)).unwrap();
    assert_eq!(tar.path, temp.path().join("d.tar"));
    let compressed = run(|s| codec::compress(&tar.path, s)).unwrap();
    assert_eq!(compressed.path, temp.path().join("d.tar.sz"));

    fs::remove_dir_all(&dir).unwrap();
    fs::remove_file(&tar.path).unwrap();
    let outcome = run(|s| analyze(&compressed.path, s)).unwrap();
    let Outcome::Extracted { archive, report } = outcome else {
        panic!("expected extraction");
    };
    assert_eq!(archive, temp.path().join("d.tar"));
    assert!(!archive.exists());
    assert_eq!(report.hardlinks_created, 1);

    let a = fs::metadata(dir.join("a.txt")).unwrap();
    let b = fs::metadata(dir.join("b.txt")).unwrap();
    assert_eq!(a.ino(), b.ino());
    assert_eq!(fs::read(dir.join("a.txt")).unwrap(), b"hi");
    assert_eq!(fs::read(dir.join("b.txt")).unwrap(), b"hi");
}

#[cfg(unix)]
#[test]
fn test_directory_round_trip_preserves_links_and_modes() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("tree");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("run.sh"), b"#!/bin/sh\n").unwrap();
    fs::set_permissions(dir.join("run.sh"), fs::Permissions::from_mode(0o750)).unwrap();
    std::os::unix::fs::symlink("run.sh", dir.join("latest")).unwrap();
    std::os::unix::fs::symlink("../outside", dir.join("dangling")).unwrap();
    fs::create_dir(dir.join("shared")).unwrap();
    fs::set_permissions(dir.join("shared"), fs::Permissions::from_mode(0o775)).unwrap();
    fs::write(dir.join("shared/notes.txt"), b"team").unwrap();
    fs::set_permissions(
        dir.join("shared/notes.txt"),
        fs::Permissions::from_mode(0o664),
    )
    .unwrap();

    let archived = run(|s| analyze(&dir, s)).unwrap();
    fs::remove_dir_all(&dir).unwrap();
    run(|s| analyze(archived.output(), s)).unwrap();

    let mode = fs::metadata(dir.join("run.sh")).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o750);
    let mode_of = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode_of(&dir.join("shared")), 0o775);
    assert_eq!(mode_of(&dir.join("shared/notes.txt")), 0o664);
    assert_eq!(fs::read_link(dir.join("latest")).unwrap(), Path::new("run.sh"));
    assert_eq!(
        fs::read_link(dir.join("dangling")).unwrap(),
        Path::new("../outside")
    );
}

#[test]
fn test_progress_reports_bytes_for_compression() {
    #[derive(Default)]
    struct Totals {
        starts: Vec<(u64, ProgressUnit)>,
        last: Option<(u64, u64)>,
        finished: bool,
    }

    impl ProgressSink for Totals {
        fn on_start(&mut self, _label: &Path, total: u64, unit: ProgressUnit) {
            self.starts.push((total, unit));
        }

        fn on_progress(&mut self, transferred: u64, total: u64) {
            self.last = Some((transferred, total));
        }

        fn on_finish(&mut self) {
            self.finished = true;
        }
    }

    let temp = TempDir::new().unwrap();
    let input = temp.path().join("data");
    fs::write(&input, vec![1u8; 4096]).unwrap();

    let config = SzConfig::default();
    let mut totals = Totals::default();
    let mut session = Session::new(&config, &mut totals);
    analyze(&input, &mut session).unwrap();

    assert_eq!(totals.starts, vec![(4096, ProgressUnit::Bytes)]);
    assert_eq!(totals.last, Some((4096, 4096)));
    assert!(totals.finished);
}

#[test]
fn test_missing_input_does_not_stop_batch() {
    let temp = TempDir::new().unwrap();
    let good = temp.path().join("good");
    fs::write(&good, b"x").unwrap();

    let inputs = [temp.path().join("missing"), good];
    let results = sz_core::analyze_all(&inputs, &SzConfig::default(), |_| {
        Box::new(NoopProgress)
    });

    assert!(matches!(results[0].result, Err(SzError::Io(_))));
    assert!(results[1].result.is_ok());
}
