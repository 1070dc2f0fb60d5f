use std::path::PathBuf;

/// Fixed control socket shared by every invocation.  There is only ever one
/// player session, so the path carries no per-session component.
pub const MPV_SOCKET_NAME: &str = "rofi_tidal_mpv.sock";
pub const CONTEXT_FILE_NAME: &str = "rofi_tidal_context.json";
pub const SESSION_FILE_NAME: &str = "tidal_session.json";

pub fn mpv_socket_path() -> PathBuf {
    temp_dir().join(MPV_SOCKET_NAME)
}

pub fn mpv_socket_arg(socket: &std::path::Path) -> String {
    format!("--input-ipc-server={}", socket.display())
}

pub fn context_file_path() -> PathBuf {
    temp_dir().join(CONTEXT_FILE_NAME)
}

/// Written by the external login helper, read-only here.
pub fn session_file_path() -> PathBuf {
    home_dir().join(".config").join(SESSION_FILE_NAME)
}

pub fn temp_dir() -> PathBuf {
    // mpv and the launcher agree on /tmp regardless of $TMPDIR
    PathBuf::from("/tmp")
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

pub fn config_dir() -> PathBuf {
    // Always ~/.config/rofi-tidal/, same as the rest of the rofi scripts
    home_dir().join(".config").join("rofi-tidal")
}

pub fn data_dir() -> PathBuf {
    home_dir().join(".local").join("share").join("rofi-tidal")
}

pub fn mpv_binary_name() -> &'static str {
    "mpv"
}

/// Find mpv on `PATH`.
pub fn find_mpv_binary() -> Option<PathBuf> {
    find_on_path(mpv_binary_name())
}

pub fn find_on_path(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_arg_embeds_path() {
        let arg = mpv_socket_arg(&mpv_socket_path());
        assert_eq!(arg, "--input-ipc-server=/tmp/rofi_tidal_mpv.sock");
    }

    #[test]
    fn test_context_file_is_in_tmp() {
        assert_eq!(
            context_file_path(),
            PathBuf::from("/tmp/rofi_tidal_context.json")
        );
    }
}
