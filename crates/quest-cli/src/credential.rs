//! Completion API credential: loaded once at startup from the environment or
//! the data dir, with a one-time interactive capture when neither is set.

use std::io::{self, BufRead, Write};
use std::path::Path;

pub const CREDENTIAL_FILE: &str = "api_key.txt";

pub fn api_key_from_env() -> Option<String> {
    std::env::var("QUEST_OPENAI_API_KEY")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn stored_api_key(data_dir: &Path) -> Option<String> {
    let raw = std::fs::read_to_string(data_dir.join(CREDENTIAL_FILE)).ok()?;
    let key = raw.trim().to_string();
    (!key.is_empty()).then_some(key)
}

/// Environment wins over the stored file.
pub fn load_api_key(data_dir: &Path) -> Option<String> {
    api_key_from_env().or_else(|| stored_api_key(data_dir))
}

pub fn save_api_key(data_dir: &Path, key: &str) -> io::Result<()> {
    std::fs::create_dir_all(data_dir)?;
    std::fs::write(data_dir.join(CREDENTIAL_FILE), key)
}

/// Prompt for a key on stdin; opt-in persistence as plaintext.
pub fn capture_api_key(data_dir: &Path) -> io::Result<String> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut out = io::stdout();

    writeln!(out, "No API key found.")?;
    write!(out, "Insert your API key here: ")?;
    out.flush()?;
    let key = lines
        .next()
        .transpose()?
        .unwrap_or_default()
        .trim()
        .to_string();
    if key.is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty API key"));
    }

    write!(
        out,
        "Save my key? NOTE: it will be stored in a local file without encryption. [y/N] "
    )?;
    out.flush()?;
    let answer = lines.next().transpose()?.unwrap_or_default();
    if answer.trim().eq_ignore_ascii_case("y") {
        save_api_key(data_dir, &key)?;
        writeln!(out, "Saved to {}.", data_dir.join(CREDENTIAL_FILE).display())?;
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EnvGuard {
        k: &'static str,
        prev: Option<String>,
    }

    impl EnvGuard {
        fn set(k: &'static str, v: &str) -> Self {
            let prev = std::env::var(k).ok();
            std::env::set_var(k, v);
            Self { k, prev }
        }

        fn unset(k: &'static str) -> Self {
            let prev = std::env::var(k).ok();
            std::env::remove_var(k);
            Self { k, prev }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(v) = self.prev.take() {
                std::env::set_var(self.k, v);
            } else {
                std::env::remove_var(self.k);
            }
        }
    }

    #[test]
    fn environment_wins_over_stored_file() {
        let tmp = tempfile::tempdir().unwrap();
        save_api_key(tmp.path(), "from-file").unwrap();

        let _g = EnvGuard::set("QUEST_OPENAI_API_KEY", "from-env");
        assert_eq!(load_api_key(tmp.path()).as_deref(), Some("from-env"));
    }

    #[test]
    fn stored_key_is_trimmed_and_blank_file_counts_as_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let _g = EnvGuard::unset("QUEST_OPENAI_API_KEY");

        save_api_key(tmp.path(), "  sk-abc  \n").unwrap();
        assert_eq!(load_api_key(tmp.path()).as_deref(), Some("sk-abc"));

        save_api_key(tmp.path(), "   \n").unwrap();
        assert_eq!(load_api_key(tmp.path()), None);
    }

    #[test]
    fn empty_env_var_is_treated_as_unset() {
        let _g = EnvGuard::set("QUEST_OPENAI_API_KEY", "   ");
        assert!(api_key_from_env().is_none());
    }
}
