//! Tests for engine support library staging

use std::fs;

use symbolizer_core::staging::{DependencyLayout, StagedLibrary, DEFAULT_INSTALL_DIR, SUPPORT_LIBRARIES};
use symbolizer_core::types::Architecture;
use symbolizer_core::SymbolizerError;
use tempfile::TempDir;

fn layout() -> (TempDir, DependencyLayout)
{
    let root = tempfile::tempdir().unwrap();
    let exe = root.path().join("bin");
    let install = root.path().join("install");
    fs::create_dir_all(&exe).unwrap();
    fs::create_dir_all(&install).unwrap();
    (root, DependencyLayout::new(exe, install))
}

#[test]
fn test_support_libraries()
{
    assert_eq!(SUPPORT_LIBRARIES, ["dbghelp.dll", "symsrv.dll", "dbgeng.dll", "dbgcore.dll"]);
}

#[test]
fn test_default_install_dir_matches_architecture()
{
    assert!(DEFAULT_INSTALL_DIR.ends_with(Architecture::current().debugger_dir()));
}

#[test]
fn test_library_already_present()
{
    let (_root, layout) = layout();
    fs::write(layout.executable_dir.join("dbghelp.dll"), b"local").unwrap();
    fs::write(layout.install_dir.join("dbghelp.dll"), b"installed").unwrap();

    let staged = layout.stage(&["dbghelp.dll"]).unwrap();

    assert_eq!(staged, vec![StagedLibrary::AlreadyPresent(layout.executable_dir.join("dbghelp.dll"))]);
    // The local copy wins and is left alone
    assert_eq!(fs::read(layout.executable_dir.join("dbghelp.dll")).unwrap(), b"local");
}

#[test]
fn test_library_copied_from_install_dir()
{
    let (_root, layout) = layout();
    fs::write(layout.install_dir.join("symsrv.dll"), b"installed").unwrap();

    let staged = layout.stage(&["symsrv.dll"]).unwrap();

    assert_eq!(
        staged,
        vec![StagedLibrary::Copied {
            from: layout.install_dir.join("symsrv.dll"),
            to: layout.executable_dir.join("symsrv.dll"),
        }]
    );
    assert_eq!(staged[0].path(), layout.executable_dir.join("symsrv.dll"));
    assert_eq!(fs::read(layout.executable_dir.join("symsrv.dll")).unwrap(), b"installed");
}

#[test]
fn test_missing_library_lists_searched_paths()
{
    let (_root, layout) = layout();

    let err = layout.stage(&["dbgeng.dll"]).unwrap_err();

    match &err {
        SymbolizerError::MissingDependency { library, searched } => {
            assert_eq!(library, "dbgeng.dll");
            assert_eq!(
                searched,
                &vec![layout.executable_dir.join("dbgeng.dll"), layout.install_dir.join("dbgeng.dll")]
            );
        }
        other => panic!("Expected MissingDependency, got {other:?}"),
    }
    let message = err.to_string();
    assert!(message.contains("dbgeng.dll"));
    assert!(message.contains("install"));
}

#[test]
fn test_staging_stops_at_first_missing_library()
{
    let (_root, layout) = layout();
    fs::write(layout.install_dir.join("dbghelp.dll"), b"a").unwrap();
    fs::write(layout.install_dir.join("dbgeng.dll"), b"c").unwrap();

    let err = layout.stage(&SUPPORT_LIBRARIES).unwrap_err();

    assert!(matches!(err, SymbolizerError::MissingDependency { ref library, .. } if library == "symsrv.dll"));
    // Earlier copies stay, later libraries were never looked at
    assert!(layout.executable_dir.join("dbghelp.dll").is_file());
    assert!(!layout.executable_dir.join("dbgeng.dll").exists());
}

#[test]
fn test_directory_is_not_a_library()
{
    let (_root, layout) = layout();
    fs::create_dir_all(layout.executable_dir.join("dbgcore.dll")).unwrap();

    let err = layout.stage(&["dbgcore.dll"]).unwrap_err();

    assert!(matches!(err, SymbolizerError::MissingDependency { .. }));
}

#[test]
fn test_layout_for_current_exe()
{
    let layout = DependencyLayout::for_current_exe().unwrap();

    let exe = std::env::current_exe().unwrap();
    assert_eq!(Some(layout.executable_dir.as_path()), exe.parent());
    assert_eq!(layout.install_dir, *DEFAULT_INSTALL_DIR);
}
