use std::{
    ffi::OsString,
    io,
    path::{Path, PathBuf},
};

use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestCase {
    ordinal: usize,
    name: String,
    input_path: PathBuf,
    answer_path: PathBuf,
}

impl TestCase {
    pub fn new(
        name: impl Into<String>,
        input: impl Into<PathBuf>,
        answer: impl Into<PathBuf>,
    ) -> Self {
        Self {
            ordinal: 0,
            name: name.into(),
            input_path: input.into(),
            answer_path: answer.into(),
        }
    }

    /// 1-based position in the run order, 0 if not part of a [`TestSet`].
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn answer_path(&self) -> &Path {
        &self.answer_path
    }
}

pub trait TestcaseFinder {
    fn find_by_input_file_path(&self, path: &Path) -> Option<TestCase>;
}

/// `<name>` matching `input_pattern` is an input; `<name><answer_suffix>` is its answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixConvention {
    input_pattern: glob::Pattern,
    answer_suffix: String,
}

impl SuffixConvention {
    pub const DEFAULT_INPUT_PATTERN: &str = "*.t";
    pub const DEFAULT_ANSWER_SUFFIX: &str = ".a";

    pub fn new(input_pattern: &str, answer_suffix: impl Into<String>) -> Result<Self> {
        let input_pattern = glob::Pattern::new(input_pattern)
            .map_err(|e| Error::InvalidPattern(input_pattern.to_owned(), e))?;
        Ok(Self {
            input_pattern,
            answer_suffix: answer_suffix.into(),
        })
    }

    pub fn answer_path_for(&self, input: &Path) -> PathBuf {
        let mut filename = input.file_name().map(OsString::from).unwrap_or_default();
        filename.push(&self.answer_suffix);
        input.with_file_name(filename)
    }
}

impl Default for SuffixConvention {
    fn default() -> Self {
        Self {
            input_pattern: glob::Pattern::new(Self::DEFAULT_INPUT_PATTERN)
                .unwrap_or_else(|_| unreachable!()),
            answer_suffix: Self::DEFAULT_ANSWER_SUFFIX.to_owned(),
        }
    }
}

impl TestcaseFinder for SuffixConvention {
    fn find_by_input_file_path(&self, path: &Path) -> Option<TestCase> {
        let name = path.file_name()?.to_string_lossy();
        if !self.input_pattern.matches(&name) {
            return None;
        }
        Some(TestCase::new(
            name.as_ref(),
            path,
            self.answer_path_for(path),
        ))
    }
}

/// The ordered testcases of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestSet {
    cases: Vec<TestCase>,
}

impl TestSet {
    /// Collects every file in `dir` the finder accepts, sorted by name.
    pub fn discover(dir: impl AsRef<Path>, finder: &impl TestcaseFinder) -> Result<Self> {
        let dir = dir.as_ref();
        let mut cases = Vec::new();
        for entry in fsutil::read_dir(dir)? {
            let entry = entry.map_err(self::read_dir_error(dir))?;
            if entry.file_type().map_err(self::read_dir_error(dir))?.is_dir() {
                continue;
            }
            if let Some(t) = finder.find_by_input_file_path(&entry.path()) {
                cases.push(t)
            }
        }
        cases.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.input_path.cmp(&b.input_path))
        });
        Ok(Self::from_cases(cases))
    }

    pub fn from_cases(mut cases: Vec<TestCase>) -> Self {
        for (i, t) in cases.iter_mut().enumerate() {
            t.ordinal = i + 1;
        }
        Self { cases }
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TestCase> {
        self.cases.iter()
    }

    pub fn as_slice(&self) -> &[TestCase] {
        &self.cases
    }
}

impl<'a> IntoIterator for &'a TestSet {
    type Item = &'a TestCase;
    type IntoIter = std::slice::Iter<'a, TestCase>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn read_dir_error(dir: &Path) -> impl FnOnce(io::Error) -> Error + '_ {
    move |e| fsutil::Error::SingleIO("Cannot read dir", dir.to_owned(), e).into()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testutil::TempDir;

    fn names(set: &TestSet) -> Vec<&str> {
        set.iter().map(TestCase::name).collect()
    }

    #[test]
    fn entry_errors_should_carry_the_tests_dir() {
        let dir = Path::new("/srv/tests");
        let err = read_dir_error(dir)(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(
            matches!(
                &err,
                Error::Fs(fsutil::Error::SingleIO("Cannot read dir", p, _)) if p == dir
            ),
            "{:?}",
            err
        );
    }

    #[test]
    fn should_pair_inputs_with_answers_in_lexical_order() {
        let dir = TempDir::new();
        for name in ["010.t", "002.t", "001.t"] {
            dir.write(name, "in");
            dir.write(format!("{}.a", name), "ans");
        }
        dir.write("notes.txt", "ignored");
        fsutil::mkdir_all(dir.path().join("999.t")).unwrap();

        let set = TestSet::discover(dir.path(), &SuffixConvention::default()).unwrap();
        assert_eq!(names(&set), ["001.t", "002.t", "010.t"]);

        let first = &set.as_slice()[0];
        assert_eq!(first.ordinal(), 1);
        assert_eq!(first.input_path(), dir.path().join("001.t"));
        assert_eq!(first.answer_path(), dir.path().join("001.t.a"));
        assert_eq!(set.as_slice()[2].ordinal(), 3);
    }

    #[test]
    fn inputs_without_answers_should_still_be_discovered() {
        let dir = TempDir::new();
        dir.write("a.t", "");

        let set = TestSet::discover(dir.path(), &SuffixConvention::default()).unwrap();
        assert_eq!(names(&set), ["a.t"]);
        assert!(!set.as_slice()[0].answer_path().exists());
    }

    #[test]
    fn empty_dir_should_give_empty_set() {
        let dir = TempDir::new();
        dir.write("README", "no tests here");

        let set = TestSet::discover(dir.path(), &SuffixConvention::default()).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn missing_dir_should_be_error() {
        let dir = TempDir::new();
        let res = TestSet::discover(dir.path().join("nowhere"), &SuffixConvention::default());
        assert!(matches!(res, Err(Error::Fs(_))));
    }

    #[test]
    fn custom_convention_should_be_respected() {
        let dir = TempDir::new();
        dir.write("sample-1.in", "");
        dir.write("sample-1.in.out", "");
        dir.write("001.t", "");

        let conv = SuffixConvention::new("*.in", ".out").unwrap();
        let set = TestSet::discover(dir.path(), &conv).unwrap();
        assert_eq!(names(&set), ["sample-1.in"]);
        assert_eq!(
            set.as_slice()[0].answer_path(),
            dir.path().join("sample-1.in.out")
        );
    }

    #[test]
    fn invalid_pattern_should_be_rejected() {
        let res = SuffixConvention::new("[", ".a");
        assert!(matches!(res, Err(Error::InvalidPattern(..))));
    }

    #[test]
    fn answer_path_should_append_suffix() {
        let conv = SuffixConvention::default();
        assert_eq!(
            conv.answer_path_for(Path::new("tests/001.t")),
            Path::new("tests/001.t.a")
        );
    }
}
