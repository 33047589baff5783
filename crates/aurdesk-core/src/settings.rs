use std::path::PathBuf;

/// Paths and endpoints handed to the subsystem by the configuration
/// collaborator. Values arrive as strings with environment references
/// already meaningful to the user; expansion happens here, parsing any
/// configuration file does not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub root: PathBuf,
    pub db_path: PathBuf,
    pub helper_path: PathBuf,
    pub escalation_path: PathBuf,
    pub prefix: PathBuf,
    pub aur_url: String,
}

impl Settings {
    pub fn from_values(
        root: &str,
        db_path: &str,
        helper_path: &str,
        escalation_path: &str,
        prefix: &str,
        aur_url: &str,
    ) -> Self {
        Self {
            root: PathBuf::from(expand_env(root)),
            db_path: PathBuf::from(expand_env(db_path)),
            helper_path: PathBuf::from(expand_env(helper_path)),
            escalation_path: PathBuf::from(expand_env(escalation_path)),
            prefix: PathBuf::from(expand_env(prefix)),
            aur_url: expand_env(aur_url),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/"),
            db_path: PathBuf::from("/var/lib/pacman"),
            helper_path: PathBuf::from("/usr/lib/aurdesk/aurdesk-helper"),
            escalation_path: PathBuf::from("/usr/bin/pkexec"),
            prefix: default_prefix(),
            aur_url: "https://aur.archlinux.org/rpc/v5".to_string(),
        }
    }
}

pub(crate) fn default_prefix() -> PathBuf {
    match std::env::var("AURDESK_PREFIX") {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => PathBuf::from("/var/tmp/aurdesk"),
    }
}

/// Expands `$VAR` and `${VAR}` references. Unset variables expand to the
/// empty string, shell-style. A `$` not followed by a name is literal.
pub fn expand_env(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            out.push(ch);
            continue;
        }

        match chars.peek().copied() {
            Some('{') => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == '}' {
                        closed = true;
                        break;
                    }
                    name.push(inner);
                }
                if !closed {
                    out.push_str("${");
                    out.push_str(&name);
                } else if let Ok(value) = std::env::var(&name) {
                    out.push_str(&value);
                }
            }
            Some(next) if next.is_ascii_alphabetic() || next == '_' => {
                let mut name = String::new();
                while let Some(inner) = chars.peek().copied() {
                    if inner.is_ascii_alphanumeric() || inner == '_' {
                        name.push(inner);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if let Ok(value) = std::env::var(&name) {
                    out.push_str(&value);
                }
            }
            _ => out.push('$'),
        }
    }

    out
}
