use std::io::Read;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::cmp_config::CmpConfig;
use crate::error::{MsgError, Result};
use crate::word_gen::WordGen;
use crate::word_list::WordList;

/// Largest config file accepted by the loaders.
pub const MAX_CONFIG_FILE_SIZE: u64 = 4 * 1024 * 1024;

/// Load a word generator configuration from a JSON file.
pub fn load_word_gen(path: impl AsRef<Path>) -> Result<WordGen> {
    let word_gen: WordGen = load_json(path.as_ref())?;
    word_gen.validate()?;
    Ok(word_gen)
}

/// Load a comparator configuration from a JSON file.
///
/// Hashes are taken in file order and must already be sorted.
pub fn load_cmp_config(path: impl AsRef<Path>) -> Result<CmpConfig> {
    let config: CmpConfig = load_json(path.as_ref())?;
    config.validate()?;
    Ok(config)
}

/// Load a word list.
///
/// Files ending in `.json` hold an array of strings; anything else is read
/// as one word per line.
pub fn load_word_list(path: impl AsRef<Path>) -> Result<WordList> {
    let path = path.as_ref();
    let list = if path.extension().is_some_and(|ext| ext == "json") {
        load_json(path)?
    } else {
        let content = read_limited(path)?;
        WordList::new(content.lines().map(|line| line.trim_end_matches('\r')))
    };
    list.validate()?;
    debug!(path = %path.display(), words = list.len(), "loaded word list");
    Ok(list)
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = read_limited(path)?;
    serde_json::from_str(&content).map_err(|source| MsgError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn read_limited(path: &Path) -> Result<String> {
    let io_err = |source| MsgError::Io {
        path: path.to_path_buf(),
        source,
    };
    let too_large = |size| MsgError::ConfigTooLarge {
        path: path.to_path_buf(),
        size,
        max: MAX_CONFIG_FILE_SIZE,
    };

    let file = std::fs::File::open(path).map_err(io_err)?;
    let size = file.metadata().map_err(io_err)?.len();
    if size > MAX_CONFIG_FILE_SIZE {
        return Err(too_large(size));
    }

    // The file may grow between the size check and the read.
    let mut content = String::new();
    file.take(MAX_CONFIG_FILE_SIZE + 1)
        .read_to_string(&mut content)
        .map_err(io_err)?;
    if content.len() as u64 > MAX_CONFIG_FILE_SIZE {
        return Err(too_large(content.len() as u64));
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_temp(name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("ztex-msg-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn load_word_gen_file() {
        let path = write_temp(
            "word_gen.json",
            r#"{ "ranges": [{ "chars": "m" }], "num_generate": 1000 }"#,
        );
        let word_gen = load_word_gen(&path).unwrap();
        assert_eq!(word_gen.ranges.len(), 1);
        assert_eq!(word_gen.num_generate, 1000);
    }

    #[test]
    fn load_word_gen_rejects_invalid_config() {
        let path = write_temp(
            "word_gen_bad.json",
            r#"{ "ranges": [{ "chars": "ab", "start_idx": 5 }] }"#,
        );
        assert!(matches!(
            load_word_gen(&path),
            Err(MsgError::BadRange { index: 0, .. })
        ));
    }

    #[test]
    fn load_cmp_config_file() {
        let path = write_temp(
            "cmp.json",
            r#"{ "salt": 85, "hashes": ["0000000000000001", "0000000000000002"] }"#,
        );
        let config = load_cmp_config(&path).unwrap();
        assert_eq!(config.salt, 85);
        assert_eq!(config.hashes.len(), 2);
    }

    #[test]
    fn load_cmp_config_rejects_bad_salt() {
        let path = write_temp(
            "cmp_bad.json",
            r#"{ "salt": 4096, "hashes": ["0000000000000001"] }"#,
        );
        assert!(matches!(
            load_cmp_config(&path),
            Err(MsgError::BadSalt(0x1000))
        ));
    }

    #[test]
    fn load_word_list_json_and_text() {
        let json = write_temp("words.json", r#"["my", "abc"]"#);
        assert_eq!(load_word_list(&json).unwrap(), WordList::new(["my", "abc"]));

        let text = write_temp("words.txt", "my\r\nabc\n");
        assert_eq!(load_word_list(&text).unwrap(), WordList::new(["my", "abc"]));
    }

    #[test]
    fn malformed_json_reports_path() {
        let path = write_temp("broken.json", "{ not json");
        let err = load_word_gen(&path).unwrap_err();
        assert!(matches!(err, MsgError::Json { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_cmp_config("/nonexistent/ztex/cmp.json").unwrap_err();
        assert!(matches!(err, MsgError::Io { .. }));
    }
}
