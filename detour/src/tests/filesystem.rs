// SPDX-License-Identifier: MIT OR Apache-2.0

use detour_common::{Sysno, Value, ValueKind};
use serial_test::serial;

use crate::{
    fs,
    tests::{recording_session, temp_path},
};

#[test]
fn stat_reports_path_and_presence_slots() {
    let (session, recorder) = recording_session();
    let path = temp_path("stat");
    std::fs::write(&path, b"12345").unwrap();

    let info = fs::stat(&session, &path).unwrap();
    assert_eq!(info.size, 5);
    assert!(!info.is_dir());

    let record = recorder.last(Sysno::Stat);
    assert_eq!(record.num_args(), 1);
    assert_eq!(record.args()[0], Value::string(&path.to_string_lossy()));
    assert_eq!(record.results()[0], Value::Unsupported);
    assert_eq!(record.results()[1], Value::Error);

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn stat_on_missing_path_reports_and_errors() {
    let (session, recorder) = recording_session();
    let path = temp_path("stat_missing");

    let err = fs::stat(&session, &path).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);

    // The failed call is still observed, exactly once.
    assert_eq!(recorder.count(Sysno::Stat), 1);
}

#[test]
fn lstat_reports_without_following_symlinks() {
    let (session, recorder) = recording_session();
    let target = temp_path("lstat_target");
    let link = temp_path("lstat_link");
    std::fs::write(&target, b"x").unwrap();
    fs::symlink(&session, &target, &link).unwrap();

    assert!(fs::lstat(&session, &link).unwrap().is_symlink());
    assert!(!fs::stat(&session, &link).unwrap().is_symlink());
    assert_eq!(recorder.count(Sysno::Lstat), 1);
    assert_eq!(recorder.count(Sysno::Symlink), 1);

    std::fs::remove_file(&link).unwrap();
    std::fs::remove_file(&target).unwrap();
}

#[test]
fn rename_reports_both_paths() {
    let (session, recorder) = recording_session();
    let from = temp_path("rename_from");
    let to = temp_path("rename_to");
    std::fs::write(&from, b"x").unwrap();

    fs::rename(&session, &from, &to).unwrap();
    assert!(!from.exists());
    assert!(to.exists());

    let record = recorder.last(Sysno::Rename);
    assert_eq!(record.num_args(), 2);
    assert_eq!(record.args()[0], Value::string(&from.to_string_lossy()));
    assert_eq!(record.args()[1], Value::string(&to.to_string_lossy()));
    assert_eq!(record.num_results(), 1);
    assert_eq!(record.results()[0], Value::Error);

    std::fs::remove_file(&to).unwrap();
}

#[test]
fn link_creates_and_reports() {
    let (session, recorder) = recording_session();
    let original = temp_path("link_original");
    let link = temp_path("link_new");
    std::fs::write(&original, b"shared").unwrap();

    fs::link(&session, &original, &link).unwrap();
    assert_eq!(std::fs::read(&link).unwrap(), b"shared");
    assert_eq!(recorder.count(Sysno::Link), 1);

    std::fs::remove_file(&link).unwrap();
    std::fs::remove_file(&original).unwrap();
}

#[test]
fn read_link_result_is_the_post_call_target() {
    let (session, recorder) = recording_session();
    let target = temp_path("readlink_target");
    let link = temp_path("readlink_link");
    std::fs::write(&target, b"x").unwrap();
    fs::symlink(&session, &target, &link).unwrap();

    let resolved = fs::read_link(&session, &link).unwrap();
    assert_eq!(resolved, target);

    let record = recorder.last(Sysno::ReadLink);
    assert_eq!(record.args()[0], Value::string(&link.to_string_lossy()));
    assert_eq!(record.results()[0], Value::string(&target.to_string_lossy()));

    std::fs::remove_file(&link).unwrap();
    std::fs::remove_file(&target).unwrap();
}

#[test]
fn mkdir_rmdir_round_trip_reports() {
    let (session, recorder) = recording_session();
    let dir = temp_path("mkdir");

    fs::mkdir(&session, &dir, 0o755).unwrap();
    assert!(dir.is_dir());
    let record = recorder.last(Sysno::Mkdir);
    assert_eq!(record.args()[1], Value::Integer(0o755));

    fs::rmdir(&session, &dir).unwrap();
    assert!(!dir.exists());
    assert_eq!(recorder.count(Sysno::Rmdir), 1);
}

#[test]
fn unlink_missing_file_still_reports() {
    let (session, recorder) = recording_session();
    let path = temp_path("unlink_missing");

    assert!(fs::unlink(&session, &path).is_err());
    assert_eq!(recorder.count(Sysno::Unlink), 1);
}

#[test]
fn chmod_and_truncate_report_their_arguments() {
    let (session, recorder) = recording_session();
    let path = temp_path("chmod_truncate");
    std::fs::write(&path, b"0123456789").unwrap();

    fs::chmod(&session, &path, 0o600).unwrap();
    assert_eq!(
        recorder.last(Sysno::Chmod).args()[1],
        Value::Integer(0o600)
    );

    fs::truncate(&session, &path, 4).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"0123");
    assert_eq!(
        recorder.last(Sysno::Truncate).args()[1],
        Value::Integer64(4)
    );

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn chown_to_current_owner_reports_ids() {
    let (session, recorder) = recording_session();
    let path = temp_path("chown");
    std::fs::write(&path, b"x").unwrap();

    let uid = unsafe { libc::getuid() };
    let gid = unsafe { libc::getgid() };
    fs::chown(&session, &path, uid, gid).unwrap();
    fs::lchown(&session, &path, uid, gid).unwrap();

    let record = recorder.last(Sysno::Chown);
    assert_eq!(record.args()[1], Value::Integer(uid as isize));
    assert_eq!(record.args()[2], Value::Integer(gid as isize));
    assert_eq!(recorder.count(Sysno::Lchown), 1);

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn utimes_reports_both_instants() {
    let (session, recorder) = recording_session();
    let path = temp_path("utimes");
    std::fs::write(&path, b"x").unwrap();

    let instant = std::time::UNIX_EPOCH + std::time::Duration::from_secs(1_500_000_000);
    fs::utimes(&session, &path, instant, instant).unwrap();

    let info = fs::stat(&session, &path).unwrap();
    assert_eq!(info.modified_sec, 1_500_000_000);

    let record = recorder.last(Sysno::Utimes);
    assert_eq!(record.num_args(), 3);
    assert_eq!(record.args()[1], Value::Integer64(1_500_000_000 * 1_000_000_000));
    assert_eq!(record.args()[2], Value::Integer64(1_500_000_000 * 1_000_000_000));

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn read_dir_names_reports_entry_count() {
    let (session, recorder) = recording_session();
    let dir = temp_path("readdirnames");
    std::fs::create_dir(&dir).unwrap();
    std::fs::write(dir.join("a"), b"").unwrap();
    std::fs::write(dir.join("b"), b"").unwrap();

    let mut names = fs::read_dir_names(&session, &dir).unwrap();
    names.sort();
    assert_eq!(names, ["a", "b"]);

    let record = recorder.last(Sysno::ReadDirNames);
    assert_eq!(record.results()[0], Value::array(2));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn read_dir_reports_count_and_returns_metadata() {
    let (session, recorder) = recording_session();
    let dir = temp_path("readdir");
    std::fs::create_dir(&dir).unwrap();
    std::fs::write(dir.join("entry"), b"12345").unwrap();

    let entries = fs::read_dir(&session, &dir).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, "entry");
    assert_eq!(entries[0].1.size, 5);

    let record = recorder.last(Sysno::ReadDir);
    assert_eq!(record.results()[0], Value::array(1));
    assert_eq!(record.results()[1], Value::Error);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn file_metadata_and_mutators_report_by_handle() {
    let (session, recorder) = recording_session();
    let path = temp_path("file_mutators");

    let file = fs::File::create(&session, &path).unwrap();
    file.pwrite(b"0123456789", 0).unwrap();

    assert_eq!(file.metadata().unwrap().size, 10);
    assert_eq!(
        recorder.last(Sysno::Fstat).args()[0].kind(),
        ValueKind::Handle
    );

    file.set_len(3).unwrap();
    assert_eq!(file.metadata().unwrap().size, 3);
    assert_eq!(
        recorder.last(Sysno::Ftruncate).args()[1],
        Value::Integer64(3)
    );

    file.sync_all().unwrap();
    assert_eq!(recorder.count(Sysno::Fsync), 1);

    file.set_permissions(0o640).unwrap();
    assert_eq!(
        recorder.last(Sysno::Fchmod).args()[1],
        Value::Integer(0o640)
    );

    let uid = unsafe { libc::getuid() };
    let gid = unsafe { libc::getgid() };
    file.chown(uid, gid).unwrap();
    assert_eq!(recorder.count(Sysno::Fchown), 1);

    drop(file);
    std::fs::remove_file(&path).unwrap();
}

#[test]
#[serial(cwd)]
fn chdir_and_fchdir_report_and_restore() {
    let (session, recorder) = recording_session();
    let home = std::env::current_dir().unwrap();
    let dir = temp_path("chdir");
    std::fs::create_dir(&dir).unwrap();

    fs::chdir(&session, &dir).unwrap();
    assert_eq!(
        std::fs::canonicalize(std::env::current_dir().unwrap()).unwrap(),
        std::fs::canonicalize(&dir).unwrap()
    );
    assert_eq!(
        recorder.last(Sysno::Chdir).args()[0],
        Value::string(&dir.to_string_lossy())
    );

    let back = fs::File::open(&session, &home).unwrap();
    back.change_dir().unwrap();
    assert_eq!(std::env::current_dir().unwrap(), home);
    assert_eq!(recorder.count(Sysno::Fchdir), 1);

    drop(back);
    std::fs::remove_dir(&dir).unwrap();
}
