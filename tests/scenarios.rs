use std::fs;
use std::io;

use tempdir::TempDir;
use zipfs_kit::{
    ArchiveError, BufferComparator, FsBackend, HostFS, MemoryObserver, MountMode, ReadMethod,
    StoreError, StreamTimer, ZipFS,
};

fn setup_test_env() -> TempDir {
    TempDir::new("scenarios").unwrap()
}

#[test]
fn hello_entry_in_fresh_container() {
    let temp_dir = setup_test_env();
    let zip = ZipFS::new(temp_dir.path().join("example.zip"));

    zip.write_entry("hello.txt", "Hi").unwrap();

    assert!(zip.entry_exists("hello.txt").unwrap());
    assert!(!zip.entry_exists("missing.txt").unwrap());
    assert_eq!(zip.read_entry("/hello.txt").unwrap(), b"Hi");
    match zip.read_entry("missing.txt") {
        Err(ArchiveError::EntryNotFound { entry, .. }) => assert_eq!(entry, "/missing.txt"),
        other => panic!("expected EntryNotFound, got {other:?}"),
    }
}

#[test]
fn import_external_file() {
    let temp_dir = setup_test_env();
    let external = temp_dir.path().join("external.txt");
    fs::write(&external, "X").unwrap();
    let zip = ZipFS::new(temp_dir.path().join("example.zip"));

    zip.copy_external_file(&external, "x.bin").unwrap();

    assert_eq!(zip.read_entry("x.bin").unwrap(), b"X");
    assert_eq!(zip.list_entries().unwrap(), vec!["/x.bin"]);
}

#[test]
fn import_missing_external_file_leaves_container_absent() {
    let temp_dir = setup_test_env();
    let container = temp_dir.path().join("example.zip");
    let zip = ZipFS::new(&container);

    let result = zip.copy_external_file(temp_dir.path().join("nope.txt"), "x.bin");

    assert!(matches!(
        result,
        Err(ArchiveError::Source(StoreError::NotFound(_)))
    ));
    assert!(!container.exists());
}

#[test]
fn entries_survive_reopening_the_container() {
    let temp_dir = setup_test_env();
    let container = temp_dir.path().join("example.zip");

    ZipFS::new(&container).write_entry("a.txt", "first").unwrap();
    ZipFS::new(&container).write_entry("b.txt", "second").unwrap();
    ZipFS::new(&container).write_entry("a.txt", "replaced").unwrap();

    let zip = ZipFS::new(&container);
    assert_eq!(zip.list_entries().unwrap(), vec!["/a.txt", "/b.txt"]);
    assert_eq!(zip.read_entry_text("a.txt").unwrap(), "replaced");
    assert_eq!(zip.read_entry_text("b.txt").unwrap(), "second");
}

#[test]
fn read_only_mount_of_missing_container() {
    let temp_dir = setup_test_env();
    let zip = ZipFS::new(temp_dir.path().join("absent.zip"));

    assert!(matches!(
        zip.mount(MountMode::ReadOnly),
        Err(ArchiveError::ContainerNotFound(_))
    ));
    assert!(matches!(
        zip.entry_exists("hello.txt"),
        Err(ArchiveError::ContainerNotFound(_))
    ));
}

#[test]
fn garbage_container_is_corrupt_not_missing() {
    let temp_dir = setup_test_env();
    let container = temp_dir.path().join("garbage.zip");
    fs::write(&container, b"this is not a zip archive").unwrap();
    let zip = ZipFS::new(&container);

    let err = zip.read_entry("hello.txt").unwrap_err();

    assert!(err.is_corrupt());
    assert!(!err.is_not_found());
    assert_eq!(fs::read(&container).unwrap(), b"this is not a zip archive");
}

#[test]
fn failed_operation_still_unmounts() {
    let temp_dir = setup_test_env();
    let container = temp_dir.path().join("example.zip");
    let observer = MemoryObserver::new();
    let mut zip = ZipFS::new(&container);
    zip.set_observer(observer.clone());

    let result: Result<(), ArchiveError> = zip.with_mount(MountMode::Create, |handle| {
        handle.write("staged.txt", b"kept")?;
        Err(ArchiveError::InvalidName("boom".into()))
    });

    assert!(matches!(result, Err(ArchiveError::InvalidName(_))));
    assert!(observer.messages().iter().any(|m| m == "archive unmounted"));
    assert_eq!(zip.read_entry("staged.txt").unwrap(), b"kept");
}

#[test]
fn move_replaces_existing_target() {
    let temp_dir = setup_test_env();
    let host = HostFS::new();
    let copy = temp_dir.path().join("copy.txt");
    let moved = temp_dir.path().join("moved.txt");
    host.write_text(&copy, "new").unwrap();
    host.write_text(&moved, "old").unwrap();

    host.move_file(&copy, &moved, true).unwrap();

    assert!(!host.exists(&copy).unwrap());
    assert_eq!(host.read_text(&moved).unwrap(), "new");
}

#[test]
fn host_file_walkthrough() {
    let temp_dir = setup_test_env();
    let host = HostFS::new();
    let notes = temp_dir.path().join("notes.txt");
    let copy = temp_dir.path().join("notes_copy.txt");
    let renamed = temp_dir.path().join("notes_renamed.txt");

    host.write_text(&notes, "Hello NIO Files!").unwrap();
    host.copy(&notes, &copy, false).unwrap();
    host.move_file(&copy, &renamed, false).unwrap();

    let record = host.stat(&renamed).unwrap();
    assert_eq!(record.size(), 16);
    assert!(record.is_file());

    let mut names: Vec<String> = host
        .list_dir(temp_dir.path())
        .unwrap()
        .map(|r| r.unwrap().path().file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["notes.txt", "notes_renamed.txt"]);

    host.delete(&notes, false).unwrap();
    host.delete(&renamed, false).unwrap();
    host.delete(&renamed, true).unwrap();
    assert!(host.list_dir(temp_dir.path()).unwrap().next().is_none());
}

#[test]
fn compare_never_fails_on_delta_sign() {
    let temp_dir = setup_test_env();
    let path = temp_dir.path().join("small.bin");
    fs::write(&path, [1u8; 16]).unwrap();

    let comparison = BufferComparator::new().compare(&path).unwrap();

    assert_eq!(comparison.unbuffered.bytes(), 16);
    assert_eq!(comparison.buffered.bytes(), 16);
    assert_eq!(
        comparison.delta_nanos(),
        comparison.unbuffered.nanos() as i128 - comparison.buffered.nanos() as i128
    );
    assert_eq!(
        comparison.delta_nanos() < 0,
        comparison.buffered.nanos() > comparison.unbuffered.nanos()
    );
}

#[test]
fn zero_byte_stream_is_measured() {
    let sample = StreamTimer::new()
        .measure(Some(io::empty()), ReadMethod::Unbuffered)
        .unwrap();

    assert_eq!(sample.bytes(), 0);
    assert_eq!(sample.method(), ReadMethod::Unbuffered);
}

fn copy_between<A: FsBackend, B: FsBackend>(from: &A, to: &B, name: &str) -> anyhow::Result<()> {
    let content = from.read(name)?;
    to.write(name, &content)?;
    Ok(())
}

#[test]
fn backends_are_interchangeable() {
    let temp_dir = setup_test_env();
    let host = HostFS::new();
    let zip = ZipFS::new(temp_dir.path().join("example.zip"));
    let host_file = temp_dir.path().join("data.txt");
    host.write_text(&host_file, "shared").unwrap();

    copy_between(&host, &zip, host_file.to_str().unwrap()).unwrap();

    let entries = zip.list_entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(zip.read(&entries[0]).unwrap(), b"shared");
}
