#![allow(dead_code)]

use provider_override::config::DEFAULT_PROVIDER_NAME;
use provider_override::settings::Settings;
use provider_override::ProvidersSection;

/// Section with the configured provider plus an unrelated neighbour.
pub fn membership_section() -> ProvidersSection {
    let parameters: Settings = [
        ("applicationName", "/"),
        ("enablePasswordReset", "true"),
        ("requiresUniqueEmail", "false"),
        ("minRequiredPasswordLength", "7"),
    ]
    .into_iter()
    .collect();

    ProvidersSection::new()
        .with_provider("AspNetSqlMembershipProvider", Settings::new())
        .with_provider(DEFAULT_PROVIDER_NAME, parameters)
}

pub fn no_overrides() -> Vec<(&'static str, &'static str)> {
    Vec::new()
}

pub mod temp_files {
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Write `content` to a temp file with the given extension; removed on drop.
    pub fn create_temp_section(content: &str, ext: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("provider_section_")
            .suffix(&format!(".{ext}"))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    pub fn create_temp_yaml(content: &str) -> NamedTempFile {
        create_temp_section(content, "yaml")
    }

    pub fn create_temp_json(content: &str) -> NamedTempFile {
        create_temp_section(content, "json")
    }
}

pub mod global_registry {
    use parking_lot::{const_mutex, Mutex, MutexGuard};

    // The process-wide registry is shared by every test in this binary.
    static GLOBAL_REGISTRY_LOCK: Mutex<()> = const_mutex(());

    pub fn lock() -> MutexGuard<'static, ()> {
        GLOBAL_REGISTRY_LOCK.lock()
    }
}
