// SPDX-License-Identifier: MIT OR Apache-2.0

//! Workload binary driven by the integration tests. Runs one named workload
//! with a session that prints every record to stdout, one per line.

use std::path::PathBuf;

use anyhow::bail;
use detour::{env, fs, process, time, EventRecord, Reporter, Session, Sysno};

struct PrintReporter;

impl Reporter for PrintReporter {
    fn report(&self, _sysno: Sysno, record: &EventRecord) {
        println!("{record}");
    }
}

fn scratch_path(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("detour_helper_{tag}_{}", std::process::id()))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args();

    // Ignore the binary name
    let _ = args.next();

    if let Some(name) = args.next() {
        match name.as_str() {
            "file_workload" => file_workload(),
            "pipe_workload" => pipe_workload(),
            "env_workload" => env_workload(),
            "process_workload" => process_workload(),
            "gate_off" => gate_off(),
            "gate_from_env" => gate_from_env(),
            name => bail!("Unknown workload name: {name}"),
        }
    } else {
        bail!("Need a workload name as the first argument, nothing provided.")
    }
}

fn file_workload() -> anyhow::Result<()> {
    let session = Session::new(PrintReporter);
    let path = scratch_path("file");

    let mut file = fs::File::create(&session, &path)?;
    file.write(b"hello from the helper")?;
    file.close()?;

    let mut file = fs::File::open(&session, &path)?;
    let mut buf = [0u8; 64];
    file.read(&mut buf)?;
    drop(file);

    fs::stat(&session, &path)?;
    fs::unlink(&session, &path)?;

    Ok(())
}

fn pipe_workload() -> anyhow::Result<()> {
    let session = Session::new(PrintReporter);

    let (mut reader, mut writer) = fs::pipe(&session)?;
    writer.write(b"ping")?;
    let mut buf = [0u8; 4];
    reader.read(&mut buf)?;
    assert_eq!(&buf, b"ping");

    Ok(())
}

fn env_workload() -> anyhow::Result<()> {
    let session = Session::new(PrintReporter);

    env::set_var(&session, "DETOUR_HELPER_VAR", "present");
    let value = env::var(&session, "DETOUR_HELPER_VAR");
    assert_eq!(value.as_deref(), Some("present"));
    env::remove_var(&session, "DETOUR_HELPER_VAR");

    // Wiping the whole environment is safe here: this process exits right
    // after and nothing downstream reads it.
    env::clear(&session);
    assert!(env::vars(&session).is_empty());

    Ok(())
}

fn process_workload() -> anyhow::Result<()> {
    let session = Session::new(PrintReporter);

    process::id(&session);
    process::page_size(&session);
    time::now(&session);
    time::sleep(&session, std::time::Duration::from_millis(1));

    Ok(())
}

fn gate_off() -> anyhow::Result<()> {
    let session = Session::with_gate(false, PrintReporter);
    let path = scratch_path("gate_off");

    let mut file = fs::File::create(&session, &path)?;
    file.write(b"silent")?;
    file.close()?;
    fs::unlink(&session, &path)?;

    println!("done");
    Ok(())
}

fn gate_from_env() -> anyhow::Result<()> {
    let session = Session::from_env(PrintReporter);
    let path = scratch_path("gate_from_env");

    let mut file = fs::File::create(&session, &path)?;
    file.write(b"maybe observed")?;
    file.close()?;
    fs::unlink(&session, &path)?;

    println!("done");
    Ok(())
}
