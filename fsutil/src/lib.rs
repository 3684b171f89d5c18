use std::{
    fs::{self, File, ReadDir},
    io::Read,
    path::Path,
};

pub mod error {
    use std::{io, path::PathBuf};

    pub type Result<T> = std::result::Result<T, self::Error>;

    type Msg = &'static str;

    #[derive(Debug, thiserror::Error)]
    pub enum Error {
        #[error("{0} ({1}): {2}")]
        SingleIO(Msg, PathBuf, #[source] io::Error),
    }
}
pub use error::{Error, Result};

#[must_use]
pub fn mkdir_all(path: impl AsRef<Path>) -> Result<()> {
    let dir = path.as_ref();
    fs::create_dir_all(dir).map_err(|e| Error::SingleIO("Cannot create dir", dir.to_owned(), e))
}

#[must_use]
pub fn write<P, C>(filepath: P, contents: C) -> Result<()>
where
    P: AsRef<Path>,
    C: AsRef<[u8]>,
{
    fs::write(&filepath, contents)
        .map_err(|e| Error::SingleIO("Cannot write file", filepath.as_ref().to_owned(), e))
}

#[must_use]
pub fn write_with_mkdir<P, C>(filepath: P, contents: C) -> Result<()>
where
    P: AsRef<Path>,
    C: AsRef<[u8]>,
{
    if let Some(dir) = filepath.as_ref().parent() {
        self::mkdir_all(dir)?;
    }
    self::write(filepath, contents)
}

#[must_use]
pub fn read_to_string(filepath: impl AsRef<Path>) -> Result<String> {
    fs::read_to_string(&filepath)
        .map_err(|e| Error::SingleIO("Cannot read file", filepath.as_ref().to_owned(), e))
}

/// Reads at most `max_bytes` from the head of the file, replacing invalid UTF-8.
/// Returns the text and whether the file was longer than `max_bytes`.
#[must_use]
pub fn read_head_lossy(filepath: impl AsRef<Path>, max_bytes: usize) -> Result<(String, bool)> {
    let filepath = filepath.as_ref();
    let f = self::open_file(filepath)?;

    let mut buf = Vec::new();
    f.take((max_bytes as u64).saturating_add(1))
        .read_to_end(&mut buf)
        .map_err(|e| Error::SingleIO("Cannot read file", filepath.to_owned(), e))?;

    let truncated = buf.len() > max_bytes;
    buf.truncate(max_bytes);
    Ok((String::from_utf8_lossy(&buf).into_owned(), truncated))
}

#[must_use]
pub fn open_file(filepath: impl AsRef<Path>) -> Result<File> {
    File::open(&filepath)
        .map_err(|e| Error::SingleIO("Cannot open file", filepath.as_ref().to_owned(), e))
}

/// Creates (or truncates) the file for writing.
#[must_use]
pub fn create_file(filepath: impl AsRef<Path>) -> Result<File> {
    File::create(&filepath)
        .map_err(|e| Error::SingleIO("Cannot create file", filepath.as_ref().to_owned(), e))
}

#[must_use]
pub fn read_dir(dir: impl AsRef<Path>) -> Result<ReadDir> {
    fs::read_dir(&dir).map_err(|e| Error::SingleIO("Cannot read dir", dir.as_ref().to_owned(), e))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::PathBuf;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("fsutil-test-{:016x}", rand::random::<u64>()));
        mkdir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn read_head_lossy_should_truncate_long_file() {
        let dir = scratch_dir();
        let path = dir.join("log.txt");
        write(&path, "0123456789").unwrap();

        assert_eq!(read_head_lossy(&path, 4).unwrap(), ("0123".to_owned(), true));
        assert_eq!(
            read_head_lossy(&path, 10).unwrap(),
            ("0123456789".to_owned(), false)
        );
        assert_eq!(
            read_head_lossy(&path, 100).unwrap(),
            ("0123456789".to_owned(), false)
        );

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn read_head_lossy_should_replace_invalid_utf8() {
        let dir = scratch_dir();
        let path = dir.join("bin.txt");
        write(&path, [b'o', b'k', 0xff, b'!']).unwrap();

        let (text, truncated) = read_head_lossy(&path, 64).unwrap();
        assert_eq!(text, "ok\u{fffd}!");
        assert!(!truncated);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn errors_should_mention_the_path() {
        let dir = scratch_dir();
        let missing = dir.join("nope.txt");

        let err = open_file(&missing).unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Cannot open file"), "{}", msg);
        assert!(msg.contains("nope.txt"), "{}", msg);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn write_with_mkdir_should_create_parent_dirs() {
        let dir = scratch_dir();
        let path = dir.join("a/b/c.txt");
        write_with_mkdir(&path, "hello").unwrap();
        assert_eq!(read_to_string(&path).unwrap(), "hello");

        fs::remove_dir_all(dir).unwrap();
    }
}
