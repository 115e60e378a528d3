//! Shell startup patching, driven end to end through the local shell.

use std::path::Path;

use filetime::FileTime;
use tempfile::TempDir;

use pylot_core::config::PylotConfig;
use pylot_core::configure::ShellConfigPatcher;
use pylot_core::session::Session;
use pylot_core::transport::LocalShell;

const SIGNATURE: &str = "##pylot:configure";

fn run_patch(home: &Path) {
    let mut config = PylotConfig::default();
    config.configure_basenames = vec![".profile".to_string()];
    config.root = home.join(".pyenv").display().to_string();
    let transport = LocalShell::new().with_env("HOME", home.display().to_string());
    let session = Session::new(&config, &transport);
    ShellConfigPatcher::new(&session).configure().unwrap();
}

fn read_profile(home: &Path) -> String {
    std::fs::read_to_string(home.join(".profile")).unwrap()
}

fn signature_count(content: &str) -> usize {
    content.lines().filter(|line| *line == SIGNATURE).count()
}

#[test]
fn patch_creates_the_file_and_injects_one_block() {
    let home = TempDir::new().unwrap();
    run_patch(home.path());

    let content = read_profile(home.path());
    assert_eq!(signature_count(&content), 2);
    assert!(content.contains("pyenv init -"));
    assert!(content.contains("export PATH="));
}

#[test]
fn patch_is_idempotent() {
    let home = TempDir::new().unwrap();
    run_patch(home.path());
    let after_first = read_profile(home.path());

    run_patch(home.path());
    let after_second = read_profile(home.path());

    assert_eq!(after_first, after_second);
    assert_eq!(signature_count(&after_second), 2);
}

#[test]
fn existing_content_is_preserved_above_the_block() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join(".profile"), "export EDITOR=vim\n").unwrap();

    run_patch(home.path());

    let content = read_profile(home.path());
    assert!(content.starts_with("export EDITOR=vim\n"));
    assert_eq!(signature_count(&content), 2);
}

#[test]
fn backup_holds_the_prepatch_content_of_each_run() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join(".profile"), "export EDITOR=vim\n").unwrap();

    run_patch(home.path());
    let backup = std::fs::read_to_string(home.path().join(".profile.orig")).unwrap();
    assert_eq!(backup, "export EDITOR=vim\n");

    let after_first = read_profile(home.path());
    run_patch(home.path());
    let backup = std::fs::read_to_string(home.path().join(".profile.orig")).unwrap();
    assert_eq!(backup, after_first);
}

#[test]
fn unchanged_content_skips_the_rewrite() {
    let home = TempDir::new().unwrap();
    run_patch(home.path());

    let profile = home.path().join(".profile");
    let sentinel = FileTime::from_unix_time(946_684_800, 0);
    filetime::set_file_mtime(&profile, sentinel).unwrap();

    run_patch(home.path());

    let metadata = std::fs::metadata(&profile).unwrap();
    assert_eq!(FileTime::from_last_modification_time(&metadata), sentinel);
}

#[test]
fn stale_block_is_replaced_not_duplicated() {
    let home = TempDir::new().unwrap();
    let stale = format!("{SIGNATURE}\n# old snippet\n{SIGNATURE}\nexport EDITOR=vim\n");
    std::fs::write(home.path().join(".profile"), stale).unwrap();

    run_patch(home.path());

    let content = read_profile(home.path());
    assert_eq!(signature_count(&content), 2);
    assert!(!content.contains("# old snippet"));
    assert!(content.contains("export EDITOR=vim\n"));
}

#[test]
fn explicit_basenames_patch_every_listed_file() {
    let home = TempDir::new().unwrap();
    let mut config = PylotConfig::default();
    config.configure_basenames = vec![".profile".to_string(), ".zshenv".to_string()];
    config.root = home.path().join(".pyenv").display().to_string();
    let transport = LocalShell::new().with_env("HOME", home.path().display().to_string());
    let session = Session::new(&config, &transport);

    ShellConfigPatcher::new(&session).configure().unwrap();

    for basename in [".profile", ".zshenv"] {
        let content = std::fs::read_to_string(home.path().join(basename)).unwrap();
        assert_eq!(signature_count(&content), 2, "{basename} should carry one block");
    }
}
