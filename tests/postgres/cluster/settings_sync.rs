//! Pulls the settings the server actually used back into the cluster handle.

use crate::postgres::helpers::BoxError;
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use postgresql_embedded::Settings;
use std::io;
use std::path::Path;

/// Line of `postmaster.pid` holding the listening port.
const PID_FILE_PORT_LINE: usize = 3;

/// Uses the password recorded in the bootstrap's password file, if any.
pub(super) fn adopt_password_file(settings: &mut Settings) -> Result<(), BoxError> {
    if let Some(password) = read_optional(&settings.password_file)? {
        let trimmed = password.trim_end();
        if !trimmed.is_empty() {
            trimmed.clone_into(&mut settings.password);
        }
    }
    Ok(())
}

/// Uses the port the running postmaster reports, if it differs.
pub(super) fn adopt_postmaster_port(settings: &mut Settings) -> Result<(), BoxError> {
    let pid_file = settings.data_dir.join("postmaster.pid");
    if let Some(port) = read_optional(&pid_file)?.as_deref().and_then(postmaster_port) {
        settings.port = port;
    }
    Ok(())
}

fn postmaster_port(pid_file: &str) -> Option<u16> {
    pid_file.lines().nth(PID_FILE_PORT_LINE)?.trim().parse().ok()
}

/// Reads a UTF-8 file, treating a missing file as `None`.
fn read_optional(path: &Path) -> Result<Option<String>, BoxError> {
    let lossy = path.to_string_lossy();
    let utf8 = Utf8Path::new(lossy.as_ref());
    let name = utf8
        .file_name()
        .ok_or_else(|| format!("{utf8} has no file name"))?;
    let parent = utf8.parent().unwrap_or_else(|| Utf8Path::new("."));
    let dir = match Dir::open_ambient_dir(parent, ambient_authority()) {
        Ok(dir) => dir,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    match dir.read_to_string(name) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::listening("4242\n/tmp/data\n1700000000\n15432\n/tmp\n", Some(15432))]
    #[case::truncated("4242\n/tmp/data\n", None)]
    #[case::garbage("4242\n/tmp/data\n1700000000\nnot-a-port\n", None)]
    fn port_is_read_from_the_fourth_line(#[case] contents: &str, #[case] expected: Option<u16>) {
        assert_eq!(postmaster_port(contents), expected);
    }

    #[rstest]
    fn missing_file_is_none() {
        let path = std::env::temp_dir().join(format!("absent-{}", uuid::Uuid::new_v4()));

        assert!(read_optional(&path).expect("read").is_none());
    }
}
