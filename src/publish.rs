use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Replace `dst` with `bytes` via write-to-temp-then-rename, so readers never
/// see a partially written file. Missing parent directories are created.
pub fn write_atomic(dst: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = dst.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = dst.with_extension(format!("tmp.{suffix:016x}"));

    let mut file = OpenOptions::new().write(true).create_new(true).open(&temp_path)?;
    let written = file.write_all(bytes).and_then(|()| file.sync_all());
    drop(file);
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    #[cfg(windows)]
    if dst.exists() {
        fs::remove_file(dst)?;
    }

    fs::rename(&temp_path, dst).inspect_err(|_| {
        let _ = fs::remove_file(&temp_path);
    })
}
