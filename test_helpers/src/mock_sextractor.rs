use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

const SCRIPT: &str = include_str!("mock_sextractor.sh");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    Crash,
    Garbage,
}

impl Mode {
    fn as_str(self) -> &'static str {
        match self {
            Mode::Normal => "normal",
            Mode::Crash => "crash",
            Mode::Garbage => "garbage",
        }
    }
}

/// Builder for a fake SExtractor executable.
///
/// With `n` sources and detection threshold `t` (1.5 unless `-DETECT_THRESH`
/// is passed) the catalog holds `min(n, floor(1.5 n / t))` rows. Row `k`
/// (1-based) has `FLAGS = 2` when `k` is a multiple of 4 and 0 otherwise,
/// `X_IMAGE = 1 + 7k mod 64`, `Y_IMAGE = 1 + 13k mod 48`,
/// `FLUX_AUTO = 10000 / k`, `ISOAREA_IMAGE = 6k`, `FWHM_IMAGE = 0.5 + 0.25k`;
/// every other column holds `k + j/100` for its `j`-th vector element.
///
/// Every invocation appends its arguments to a log file, see
/// [`MockSextractor::invocations`].
#[derive(Debug, Clone)]
pub struct MockSextractor {
    dir: PathBuf,
    sources: usize,
    mode: Mode,
    broken_discovery: bool,
}

impl MockSextractor {
    /// Mock that will be installed into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            sources: 233,
            mode: Mode::Normal,
            broken_discovery: false,
        }
    }

    pub fn with_sources(mut self, sources: usize) -> Self {
        self.sources = sources;
        self
    }

    /// Exit with a non-zero status before writing any catalog.
    pub fn crashing(mut self) -> Self {
        self.mode = Mode::Crash;
        self
    }

    /// Write a catalog that cannot be parsed.
    pub fn garbage_catalog(mut self) -> Self {
        self.mode = Mode::Garbage;
        self
    }

    /// Fail the `-dd` discovery query.
    pub fn broken_discovery(mut self) -> Self {
        self.broken_discovery = true;
        self
    }

    pub fn executable_path(&self) -> PathBuf {
        self.dir.join("sex")
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.join("sex.log")
    }

    /// Write the script and return the path of the executable.
    pub fn install(&self) -> PathBuf {
        fs::create_dir_all(&self.dir).expect("Failed to create mock directory");

        let script = SCRIPT
            .replace("@LOG@", &self.log_path().display().to_string())
            .replace("@SOURCES@", &self.sources.to_string())
            .replace("@MODE@", self.mode.as_str())
            .replace("@BROKEN@", if self.broken_discovery { "1" } else { "0" });

        let path = self.executable_path();
        // Written by a child process: a write descriptor held here could leak
        // into a concurrently forked test process and make exec fail (ETXTBSY).
        let mut writer = Command::new("sh")
            .arg("-c")
            .arg("cat > \"$0\"")
            .arg(&path)
            .stdin(Stdio::piped())
            .spawn()
            .expect("Failed to spawn sh");
        writer
            .stdin
            .take()
            .expect("stdin is piped")
            .write_all(script.as_bytes())
            .expect("Failed to write mock SExtractor");
        let status = writer.wait().expect("Failed to wait for sh");
        assert!(status.success(), "writing mock SExtractor failed: {status}");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("Failed to make mock SExtractor executable");
        path
    }

    /// Argument lists of every invocation so far, oldest first.
    pub fn invocations(&self) -> Vec<String> {
        read_lines(&self.log_path())
    }

    /// Invocations that were real runs rather than discovery queries.
    pub fn runs(&self) -> Vec<String> {
        self.invocations()
            .into_iter()
            .filter(|line| line != "-dd" && line != "-dp")
            .collect()
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    match fs::read_to_string(path) {
        Ok(text) => text.lines().map(str::to_string).collect(),
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mock_answers_discovery_queries() {
        let dir = TempDir::new().unwrap();
        let mock = MockSextractor::new(dir.path());
        let exe = mock.install();

        let output = Command::new(&exe).arg("-dp").output().unwrap();
        assert!(output.status.success());
        let text = String::from_utf8(output.stdout).unwrap();
        assert!(text.lines().any(|l| l.starts_with("#FLUX_APER(1)")));

        assert_eq!(mock.invocations(), vec!["-dp".to_string()]);
        assert!(mock.runs().is_empty());
    }

    #[test]
    fn test_broken_discovery_fails() {
        let dir = TempDir::new().unwrap();
        let exe = MockSextractor::new(dir.path()).broken_discovery().install();
        let output = Command::new(&exe).arg("-dd").output().unwrap();
        assert!(!output.status.success());
        assert!(output.stdout.is_empty());
    }
}
