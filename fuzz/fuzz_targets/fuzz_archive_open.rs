#![no_main]
use libfuzzer_sys::fuzz_target;
use xref_archive::{ArchiveMode, XRefArchive};

// Malformed archive files must fail cleanly, never panic
fuzz_target!(|data: &[u8]| {
    let temp = match tempfile::TempDir::new() {
        Ok(t) => t,
        Err(_) => return,
    };
    let path = temp.path().join("fuzz.zip");

    for mode in [ArchiveMode::Read, ArchiveMode::Update] {
        // update mode may rewrite the file, so start each mode from the input
        if std::fs::write(&path, data).is_err() {
            return;
        }
        let archive = match XRefArchive::open(&path, mode) {
            Ok(a) => a,
            Err(_) => continue,
        };
        for name in archive.entries() {
            let _ = archive.get(&name);
        }
        let _ = archive.get_major();
    }
});
