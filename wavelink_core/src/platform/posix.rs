//! POSIX shared memory and socket readiness calls

use memmap2::{MmapMut, MmapOptions};
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::mman::{shm_open, shm_unlink};
use nix::sys::stat::Mode;
use std::fs::File;
use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::{Duration, Instant};

/// How [`open_segment`] treats the named object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Create; fail with `EEXIST` if it already exists
    CreateExclusive,
    /// Open an existing object; fail with `ENOENT` if missing
    Existing,
}

/// Open a POSIX shared memory object read/write, owner-only permissions.
pub fn open_segment(os_name: &str, mode: OpenMode) -> nix::Result<File> {
    let flags = match mode {
        OpenMode::CreateExclusive => OFlag::O_CREAT | OFlag::O_EXCL | OFlag::O_RDWR,
        OpenMode::Existing => OFlag::O_RDWR,
    };
    let fd = shm_open(os_name, flags, Mode::S_IRUSR | Mode::S_IWUSR)?;
    Ok(File::from(fd))
}

/// Remove a shared memory object name. Existing mappings stay valid.
pub fn unlink_segment(os_name: &str) -> nix::Result<()> {
    shm_unlink(os_name)
}

/// Current byte length of an open shared memory object.
pub fn segment_len(file: &File) -> io::Result<usize> {
    let len = file.metadata()?.len();
    usize::try_from(len).map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "segment too large"))
}

/// Set the object's length to exactly `size` bytes.
///
/// The length only ever changes to `size`, so mappings other processes hold
/// on a same-size object stay backed. Callers clear the contents through
/// their own mapping.
pub fn resize_segment(file: &File, size: usize) -> io::Result<()> {
    let size = u64::try_from(size)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "segment too large"))?;
    if file.metadata()?.len() != size {
        file.set_len(size)?;
    }
    Ok(())
}

/// Map `size` bytes of the object shared and writable.
pub fn map_segment(file: &File, size: usize) -> io::Result<MmapMut> {
    // SAFETY: the mapping is shared with other processes by design; all
    // access goes through byte slices that are re-validated as records.
    unsafe { MmapOptions::new().len(size).map_mut(file) }
}

/// Re-issue `listen(2)` on a bound socket to apply `backlog`.
pub fn listen(socket: &impl AsRawFd, backlog: i32) -> io::Result<()> {
    // SAFETY: plain syscall on a descriptor owned by `socket`.
    let rc = unsafe { libc::listen(socket.as_raw_fd(), backlog) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

/// Wait until `fd` is readable or `timeout` elapses.
///
/// Returns `Ok(false)` on timeout and an error when the descriptor reports
/// an error or hang-up instead of data. Interrupted waits resume with the
/// remaining time.
pub fn wait_readable(fd: RawFd, timeout: Duration) -> io::Result<bool> {
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let millis = i32::try_from(remaining.as_millis()).unwrap_or(i32::MAX);
        let mut pfd = libc::pollfd {
            fd,
            events: libc::POLLIN,
            revents: 0,
        };
        // SAFETY: `pfd` is a valid pollfd for the duration of the call.
        let rc = unsafe { libc::poll(&mut pfd, 1, millis) };
        match rc {
            0 => return Ok(false),
            n if n > 0 => return readiness(pfd.revents),
            _ => {
                let err = io::Error::last_os_error();
                if err.raw_os_error() == Some(Errno::EINTR as i32) {
                    continue;
                }
                return Err(err);
            }
        }
    }
}

/// Classify the `revents` of a readable-wait.
fn readiness(revents: libc::c_short) -> io::Result<bool> {
    if revents & libc::POLLIN != 0 {
        return Ok(true);
    }
    if revents & libc::POLLNVAL != 0 {
        return Err(io::Error::from_raw_os_error(libc::EBADF));
    }
    if revents & (libc::POLLERR | libc::POLLHUP) != 0 {
        return Err(io::Error::new(
            io::ErrorKind::ConnectionAborted,
            format!("descriptor reported poll events {:#x}", revents),
        ));
    }
    Ok(false)
}
