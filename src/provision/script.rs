//! Credential and repository setup script.

use super::ProvisionError;
use crate::scc::Service;

pub const CREDENTIALS_DIR: &str = "/etc/zypp/credentials.d";

/// Name of the system-wide credentials file.
const SYSTEM_CREDENTIALS: &str = "SCCcredentials";

/// Shell lines configuring zypper for `services` with the system credentials.
///
/// Credential files are created mode 600. Each service is removed before
/// being added so the script can be re-run.
pub fn build_script(
    login: &str,
    password: &str,
    services: &[Service],
) -> Result<Vec<String>, ProvisionError> {
    let mut lines = vec![
        "#!/bin/sh".to_string(),
        "set -e".to_string(),
        "umask 077".to_string(),
    ];

    write_credentials(&mut lines, SYSTEM_CREDENTIALS, login, password);

    for service in services {
        validate_name(&service.name)?;
        let name = quote(&service.name);

        write_credentials(&mut lines, &service.name, login, password);
        lines.push(format!("zypper rs {name} 2>/dev/null || true"));
        lines.push(format!("zypper as {} {name}", quote(&service.url)));
    }

    Ok(lines)
}

fn write_credentials(lines: &mut Vec<String>, file: &str, login: &str, password: &str) {
    let path = quote(&format!("{CREDENTIALS_DIR}/{file}"));
    lines.push(format!("echo {} > {path}", quote(&format!("username={login}"))));
    lines.push(format!("echo {} >> {path}", quote(&format!("password={password}"))));
    lines.push(format!("chmod 600 {path}"));
}

/// Service names become file names under the credentials directory.
fn validate_name(name: &str) -> Result<(), ProvisionError> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\0')
    {
        return Err(ProvisionError::InvalidServiceName(name.to_string()));
    }
    Ok(())
}

/// Single-quote `s` for POSIX sh.
fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
