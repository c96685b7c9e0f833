//! Assembly and execution of a single SExtractor invocation.

use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, ExitStatus};

use crate::errors::SewError;
use crate::options::Options;

/// Everything needed to run SExtractor once on one image.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub executable: &'a Path,
    pub config_path: &'a Path,
    pub image_path: &'a Path,
    pub catalog_path: &'a Path,
    pub options: &'a Options,
    /// Custom parameter list; overrides any `PARAMETERS_NAME` option
    pub param_file: Option<&'a Path>,
}

impl Invocation<'_> {
    /// Arguments after the executable:
    /// `-c <config> <image> -CATALOG_NAME <catalog> [-KEY value]... [-PARAMETERS_NAME <file>]`
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-c".into(),
            self.config_path.into(),
            self.image_path.into(),
            "-CATALOG_NAME".into(),
            self.catalog_path.into(),
        ];

        for (name, value) in self.options.iter() {
            if self.param_file.is_some() && name == "PARAMETERS_NAME" {
                continue;
            }
            args.push(format!("-{}", name.to_uppercase()).into());
            args.push(value.to_string().into());
        }

        if let Some(param_file) = self.param_file {
            args.push("-PARAMETERS_NAME".into());
            args.push(param_file.into());
        }

        args
    }

    pub fn command(&self) -> Command {
        let mut command = Command::new(self.executable);
        command.args(self.args());
        command
    }

    /// Human-readable command line, for logs.
    pub fn render(&self) -> String {
        let mut rendered = self.executable.display().to_string();
        for arg in self.args() {
            rendered.push(' ');
            rendered.push_str(&arg.to_string_lossy());
        }
        rendered
    }

    /// Run SExtractor and wait for it to exit.
    ///
    /// A non-zero exit status is only logged: whatever catalog the process left
    /// behind is judged by the parser.
    pub fn execute(&self) -> Result<ExitStatus, SewError> {
        log::debug!(">> {}", self.render());
        let status = self
            .command()
            .status()
            .map_err(|e| SewError::io(self.executable, e))?;

        if !status.success() {
            log::warn!(
                "SExtractor exited with {status} while processing {}",
                self.image_path.display()
            );
        }
        Ok(status)
    }
}
