use std::collections::HashSet;

use coursecheck_core::stages::{self, CODE_WITH_TESTS_STAGES, SINGLE_CODE_STAGES, STAGES};

#[test]
fn stage_names_unique_and_resolvable() {
    let mut seen = HashSet::new();
    for info in STAGES {
        assert_eq!(
            stages::from_str(info.name),
            Some(info.id),
            "stage name not resolvable: {}",
            info.name
        );
        assert!(seen.insert(info.name), "duplicate stage name {:?}", info.name);
    }
}

#[test]
fn announcements_are_progress_lines() {
    for info in STAGES {
        assert!(
            info.announcement.ends_with("..."),
            "announcement for {:?} should read as in-progress: {}",
            info.id,
            info.announcement
        );
        assert!(!coursecheck_core::messages::is_failure(info.announcement));
    }
}

#[test]
fn chains_do_not_repeat_stages() {
    for chain in [SINGLE_CODE_STAGES, CODE_WITH_TESTS_STAGES] {
        let unique: HashSet<_> = chain.iter().collect();
        assert_eq!(unique.len(), chain.len());
    }
}
