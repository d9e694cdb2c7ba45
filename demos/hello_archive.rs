use std::process::ExitCode;

use anyhow::Context;
use zipfs_kit::{BufferComparator, HostFS, ZipFS};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("hello_archive failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir().context("creating a scratch directory")?;
    println!("Temp dir: {}", tmp.path().display());

    let host = HostFS::new();
    let zip = ZipFS::new(tmp.path().join("example.zip"));

    // the container does not exist yet; the first write creates it
    zip.write_entry("hello.txt", "Привет из ZIP файловой системы!")?;
    println!("Read from zip: {}", zip.read_entry_text("/hello.txt")?);

    let external = tmp.path().join("external.txt");
    host.write_text(&external, "Содержимое внешнего файла")?;
    zip.copy_external_file(&external, "copied_external.txt")?;

    for name in ["hello.txt", "copied_external.txt", "missing.txt"] {
        println!("{name} exists: {}", zip.entry_exists(name)?);
    }
    println!("Entries: {:?}", zip.list_entries()?);

    // the container is an ordinary host file as well
    let record = host.stat(zip.container())?;
    println!("Container size: {} bytes", record.size());

    let comparison = BufferComparator::new().compare(zip.container())?;
    println!(
        "Unbuffered: {} ns, buffered: {} ns",
        comparison.unbuffered.nanos(),
        comparison.buffered.nanos()
    );

    host.delete(&external, false)?;
    host.delete(zip.container(), false)?;
    Ok(())
}
