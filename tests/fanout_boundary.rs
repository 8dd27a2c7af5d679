//! The notification log has a single writer. Every fan-out goes through
//! `services::notifications`, so self-suppression and transactional append
//! hold everywhere by construction. This test keeps it that way.

use std::fs;
use std::path::{Path, PathBuf};

fn collect_rs_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        if let Ok(read_dir) = fs::read_dir(&dir) {
            for entry in read_dir.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                } else if path.extension().map(|e| e == "rs").unwrap_or(false) {
                    files.push(path);
                }
            }
        }
    }
    files
}

fn file_contains(path: &Path, needle: &str) -> bool {
    fs::read_to_string(path)
        .map(|c| c.contains(needle))
        .unwrap_or(false)
}

#[test]
fn notification_rows_are_written_only_by_the_fanout_service() {
    let src = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src");

    let mut offenders = Vec::new();
    for file in collect_rs_files(&src) {
        let path_str = file.to_string_lossy().to_string();
        if path_str.ends_with("services/notifications.rs") {
            continue;
        }
        if file_contains(&file, "INSERT INTO notifications") {
            offenders.push(path_str);
        }
    }

    if !offenders.is_empty() {
        panic!(
            "Notification writes must go through services::notifications only. Offenders: {:?}",
            offenders
        );
    }
}

#[test]
fn opened_transition_is_scoped_to_the_recipient() {
    // Every UPDATE of the notifications table must filter on to_user.
    let src = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src");

    for file in collect_rs_files(&src) {
        let Ok(content) = fs::read_to_string(&file) else {
            continue;
        };
        for (i, _) in content.match_indices("UPDATE notifications") {
            let window = &content[i..(i + 200).min(content.len())];
            assert!(
                window.contains("to_user"),
                "unscoped notifications update in {}",
                file.display()
            );
        }
    }
}
