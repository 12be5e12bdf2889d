use super::*;

#[test]
fn none_pid_is_alive() {
    assert!(is_pid_alive(None));
}

#[test]
fn current_process_is_alive() {
    assert!(is_pid_alive(Some(std::process::id())));
}

#[test]
fn implausible_pid_is_not_alive() {
    // PID 1 is always init/pid-1 on a running Unix system; a PID far
    // beyond any plausible process table entry should read as dead.
    assert!(!is_pid_alive(Some(u32::MAX - 1)));
}
