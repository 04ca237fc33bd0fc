use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Keeps a beacon session alive and exclusive for one station
///
/// The lock is an owned resource: it is created released, `acquire` takes it,
/// `release` (or drop) gives it back. It is held as an exclusive `flock` on a
/// runtime file keyed by callsign, so a second beacon for the same station fails
/// to start instead of double-transmitting.
pub struct WakeLock {
    lock_path: PathBuf,
    lock_file: Option<File>,
}

impl WakeLock {
    /// Create a released lock for the given callsign in the runtime directory
    pub fn for_callsign(callsign: &str) -> Self {
        Self::at_path(Self::runtime_dir().join(Self::file_name(callsign)))
    }

    /// Create a released lock backed by an explicit file
    pub fn at_path<P: Into<PathBuf>>(lock_path: P) -> Self {
        Self {
            lock_path: lock_path.into(),
            lock_file: None,
        }
    }

    fn runtime_dir() -> PathBuf {
        // Use XDG runtime directory on Linux, fallback to temp directory
        match std::env::var("XDG_RUNTIME_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::temp_dir(),
        }
    }

    fn file_name(callsign: &str) -> String {
        let safe: String = callsign
            .trim()
            .to_uppercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        format!("aprs-beacon-{}.lock", safe)
    }

    pub fn path(&self) -> &Path {
        &self.lock_path
    }

    pub fn is_held(&self) -> bool {
        self.lock_file.is_some()
    }

    /// Take the lock; acquiring a lock this object already holds is a no-op
    pub fn acquire(&mut self) -> Result<()> {
        if self.is_held() {
            return Ok(());
        }

        if let Some(parent) = self.lock_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create lock directory")?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&self.lock_path)
            .with_context(|| format!("Failed to open lock file {}", self.lock_path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            let fd = lock_file.as_raw_fd();
            let result = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
            if result != 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::WouldBlock {
                    anyhow::bail!(
                        "Another beacon already holds the lock for this station: {}",
                        self.lock_path.display()
                    );
                }
                return Err(err).context("Failed to acquire wake lock");
            }
        }

        // Record the owner so stale files can be traced
        lock_file.set_len(0).context("Failed to truncate lock file")?;
        let mut writer = &lock_file;
        writeln!(writer, "{}", std::process::id()).context("Failed to write PID to lock file")?;

        info!("Acquired wake lock at {}", self.lock_path.display());
        self.lock_file = Some(lock_file);
        Ok(())
    }

    /// Give the lock back; releasing a lock that is not held is a no-op
    pub fn release(&mut self) -> Result<()> {
        let Some(lock_file) = self.lock_file.take() else {
            return Ok(());
        };

        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            let fd = lock_file.as_raw_fd();
            if unsafe { libc::flock(fd, libc::LOCK_UN) } != 0 {
                return Err(io::Error::last_os_error()).context("Failed to release wake lock");
            }
        }
        drop(lock_file);

        match std::fs::remove_file(&self.lock_path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to remove lock file {}", self.lock_path.display())
                });
            }
        }

        debug!("Released wake lock at {}", self.lock_path.display());
        Ok(())
    }
}

impl Drop for WakeLock {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!("{:#}", e);
        }
    }
}
