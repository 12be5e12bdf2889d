//! Best-effort OS process liveness probing.
//!
//! `is_pid_alive` is deliberately optimistic: a `pid` of `None` means
//! liveness was never tracked, so it counts as alive, and a permission
//! error while signaling means the process exists but we can't touch
//! it, which also counts as alive. Only a clean "no such process"
//! counts as dead. This mirrors the conservative-optimistic stance of
//! liveness checks that shell out to `kill -0`.

/// Whether the process identified by `pid` appears to still be running.
///
/// `pid = None` is treated as alive (liveness was never tracked for
/// this session).
pub fn is_pid_alive(pid: Option<u32>) -> bool {
    let Some(pid) = pid else {
        return true;
    };
    platform::probe(pid)
}

#[cfg(unix)]
mod platform {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    /// Signal-0 probe: sends no signal, just checks whether the kernel
    /// would let us address this pid at all.
    pub fn probe(pid: u32) -> bool {
        match kill(Pid::from_raw(pid as i32), None) {
            Ok(()) => true,
            // Process exists but we lack permission to signal it.
            Err(nix::errno::Errno::EPERM) => true,
            Err(nix::errno::Errno::ESRCH) => false,
            Err(_) => true,
        }
    }
}

#[cfg(not(unix))]
mod platform {
    /// No portable liveness probe off Unix; stay optimistic.
    pub fn probe(_pid: u32) -> bool {
        true
    }
}

#[cfg(test)]
#[path = "liveness_tests.rs"]
mod tests;
