//! Shell command builders for the media host
//!
//! Every interpolated path or value goes through [`quote`]. Probes print one
//! of the two markers in [`crate::probe`] instead of relying on exit codes.

use std::borrow::Cow;

use shell_escape::unix::escape;

use crate::probe::{EXISTS, NOT_FOUND};

/// POSIX-quote one shell word
#[must_use]
pub fn quote(word: &str) -> Cow<'_, str> {
    escape(Cow::Borrowed(word))
}

fn probe(test: &str) -> String {
    format!("{test} && echo {EXISTS} || echo '{NOT_FOUND}'")
}

/// Directory existence probe
#[must_use]
pub fn dir_exists(path: &str) -> String {
    probe(&format!("test -d {}", quote(path)))
}

/// Regular file existence probe
#[must_use]
pub fn file_exists(path: &str) -> String {
    probe(&format!("test -f {}", quote(path)))
}

/// OS account existence probe
#[must_use]
pub fn user_exists(login: &str) -> String {
    probe(&format!("id {} >/dev/null 2>&1", quote(login)))
}

/// Listing-based read-back used after writes
#[must_use]
pub fn listed(path: &str) -> String {
    probe(&format!("ls -la {} >/dev/null 2>&1", quote(path)))
}

#[must_use]
pub fn make_dir(path: &str) -> String {
    format!("mkdir -p {}", quote(path))
}

#[must_use]
pub fn chmod(mode: u32, path: &str) -> String {
    format!("chmod {mode:o} {}", quote(path))
}

#[must_use]
pub fn chmod_recursive(mode: u32, path: &str) -> String {
    format!("chmod -R {mode:o} {}", quote(path))
}

/// `owner` is `user` or `user:group`
#[must_use]
pub fn chown_recursive(owner: &str, path: &str) -> String {
    format!("chown -R {} {}", quote(owner), quote(path))
}

#[must_use]
pub fn remove_dir(path: &str) -> String {
    format!("rm -rf {}", quote(path))
}

#[must_use]
pub fn copy_dir(from: &str, to: &str) -> String {
    format!("cp -r {} {}", quote(from), quote(to))
}

/// Decode a base64 body into `path`
#[must_use]
pub fn write_base64(encoded: &str, path: &str) -> String {
    format!("printf '%s' {} | base64 -d > {}", quote(encoded), quote(path))
}

/// Write a literal body into `path`
#[must_use]
pub fn write_literal(content: &str, path: &str) -> String {
    format!("printf '%s' {} > {}", quote(content), quote(path))
}

#[must_use]
pub fn read_file(path: &str) -> String {
    format!("cat {}", quote(path))
}

/// Create a login-less account with its home directory
#[must_use]
pub fn create_account(login: &str, home: &str) -> String {
    format!(
        "useradd -d {} -s /usr/sbin/nologin -m {}",
        quote(home),
        quote(login)
    )
}

#[must_use]
pub fn set_password(login: &str, password: &str) -> String {
    let pair = format!("{login}:{password}");
    format!("printf '%s\\n' {} | chpasswd", quote(&pair))
}

/// Delete an account and its home; succeeds when the account is absent
#[must_use]
pub fn delete_account(login: &str) -> String {
    format!("userdel -r {} 2>/dev/null || true", quote(login))
}

#[must_use]
pub fn service_stop(unit: &str) -> String {
    format!("systemctl stop {}", quote(unit))
}

#[must_use]
pub fn service_restart(unit: &str) -> String {
    format!("systemctl restart {}", quote(unit))
}

/// Status poll; always exits 0 so the state word is what gets judged
#[must_use]
pub fn service_is_active(unit: &str) -> String {
    format!("systemctl is-active {} || true", quote(unit))
}

/// Entry names under `root`, minus the given system entries
#[must_use]
pub fn list_entries(root: &str, excluded: &[String]) -> String {
    let mut cmd = format!("ls -1 {}", quote(root));
    if !excluded.is_empty() {
        cmd.push_str(" | grep -v -x -F");
        for entry in excluded {
            cmd.push_str(" -e ");
            cmd.push_str(&quote(entry));
        }
        // grep exits 1 when every line was filtered out
        cmd.push_str(" || true");
    }
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probes_print_markers() {
        assert_eq!(
            dir_exists("/conf/acct1"),
            "test -d /conf/acct1 && echo exists || echo 'not found'"
        );
        assert_eq!(
            user_exists("acct1"),
            "id acct1 >/dev/null 2>&1 && echo exists || echo 'not found'"
        );
        assert!(listed("/conf/acct1/Application.xml").starts_with("ls -la "));
    }

    #[test]
    fn test_paths_are_quoted() {
        assert_eq!(make_dir("/tmp/a b"), "mkdir -p '/tmp/a b'");
        assert_eq!(remove_dir("/x/it's"), r"rm -rf '/x/it'\''s'");
    }

    #[test]
    fn test_modes_render_octal() {
        assert_eq!(chmod(0o777, "/f"), "chmod 777 /f");
        assert_eq!(chmod_recursive(0o755, "/d"), "chmod -R 755 /d");
        assert_eq!(chown_recursive("wowza:wowza", "/d"), "chown -R 'wowza:wowza' /d");
    }

    #[test]
    fn test_list_entries_filters_system_files() {
        let cmd = list_entries(
            "/conf",
            &["VHost.xml".to_string(), "Server.xml".to_string()],
        );
        assert_eq!(
            cmd,
            "ls -1 /conf | grep -v -x -F -e VHost.xml -e Server.xml || true"
        );
        assert_eq!(list_entries("/conf", &[]), "ls -1 /conf");
    }

    #[test]
    fn test_password_pair_quoted_once() {
        assert_eq!(
            set_password("acct1", "p$w d"),
            "printf '%s\\n' 'acct1:p$w d' | chpasswd"
        );
    }
}
