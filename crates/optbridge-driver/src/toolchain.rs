use std::fmt;
use std::path::{Path, PathBuf};

use optbridge_config::OptbridgeConfig;
use optbridge_process::{run_command_checked, CommandTemplate, RunOptions};

use crate::error::DriverError;

/// Converts between compiled classes and their assembly text.
///
/// Classes are named by internal name (`me/dkleszyk/java/option/None`).
pub trait Toolchain: fmt::Debug {
    fn disassemble(&self, class: &str) -> Result<String, DriverError>;

    /// Compiles `text` over the existing class and returns the files written.
    fn assemble(&self, class: &str, text: &str) -> Result<Vec<PathBuf>, DriverError>;
}

/// Line Krakatau prints for every class file it writes.
const WRITTEN_PREFIX: &str = "Class written to ";

#[derive(Debug)]
enum Scratch {
    Dir(PathBuf),
    Temp(tempfile::TempDir),
}

impl Scratch {
    fn path(&self) -> &Path {
        match self {
            Scratch::Dir(path) => path,
            Scratch::Temp(dir) => dir.path(),
        }
    }
}

/// Runs the configured Krakatau commands.
#[derive(Debug)]
pub struct KrakatauToolchain {
    cwd: PathBuf,
    classes: PathBuf,
    scratch: Scratch,
    disassemble: CommandTemplate,
    assemble: CommandTemplate,
    options: RunOptions,
}

impl KrakatauToolchain {
    /// `cwd` is where the commands run; config paths should already be
    /// resolved.
    pub fn from_config(config: &OptbridgeConfig, cwd: &Path) -> Result<Self, DriverError> {
        let scratch = match &config.paths.scratch {
            Some(dir) => {
                std::fs::create_dir_all(dir).map_err(|err| DriverError::io(dir, err))?;
                Scratch::Dir(dir.clone())
            }
            None => Scratch::Temp(
                tempfile::Builder::new()
                    .prefix("optbridge-")
                    .tempdir()
                    .map_err(|err| DriverError::io(std::env::temp_dir(), err))?,
            ),
        };
        tracing::debug!(scratch = %scratch.path().display(), "scratch directory");

        Ok(Self {
            cwd: cwd.to_path_buf(),
            classes: config.paths.classes.clone(),
            scratch,
            disassemble: CommandTemplate::new(config.krakatau.disassemble.clone()),
            assemble: CommandTemplate::new(config.krakatau.assemble.clone()),
            options: RunOptions::with_timeout(config.krakatau.timeout()),
        })
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    fn class_file(&self, class: &str) -> PathBuf {
        self.classes.join(format!("{class}.class"))
    }

    fn asm_file(&self, class: &str) -> PathBuf {
        self.scratch.path().join(format!("{class}.j"))
    }

    fn run(
        &self,
        step: &'static str,
        template: &CommandTemplate,
        class: &str,
        asm_file: &Path,
    ) -> Result<String, DriverError> {
        let classes = self.classes.display().to_string();
        let scratch = self.scratch.path().display().to_string();
        let class_file = self.class_file(class).display().to_string();
        let asm_file = asm_file.display().to_string();
        let vars = [
            ("classes", classes.as_str()),
            ("scratch", scratch.as_str()),
            ("class", class),
            ("class_file", class_file.as_str()),
            ("asm_file", asm_file.as_str()),
        ];
        let failed = |source| DriverError::Command {
            step,
            class: class.to_string(),
            source,
        };
        let command = template.render(&self.cwd, &vars).map_err(failed)?;
        let result = run_command_checked(&command, &self.options).map_err(failed)?;
        Ok(result.output.stdout)
    }
}

impl Toolchain for KrakatauToolchain {
    fn disassemble(&self, class: &str) -> Result<String, DriverError> {
        let class_file = self.class_file(class);
        if !class_file.is_file() {
            return Err(DriverError::MissingClass {
                class: class.to_string(),
                path: class_file,
            });
        }
        let asm_file = self.asm_file(class);
        if let Some(parent) = asm_file.parent() {
            std::fs::create_dir_all(parent).map_err(|err| DriverError::io(parent, err))?;
        }

        self.run("disassemble", &self.disassemble, class, &asm_file)?;

        // Some disassemblers ignore the package and write next to the scratch root.
        let simple = class.rsplit('/').next().unwrap_or(class);
        let flat = self.scratch.path().join(format!("{simple}.j"));
        let Some(output) = [asm_file, flat].into_iter().find(|path| path.is_file()) else {
            return Err(DriverError::MissingOutput {
                class: class.to_string(),
                path: self.scratch.path().to_path_buf(),
            });
        };
        let text = std::fs::read_to_string(&output).map_err(|err| DriverError::io(&output, err))?;
        std::fs::remove_file(&output).map_err(|err| DriverError::io(&output, err))?;
        Ok(text)
    }

    fn assemble(&self, class: &str, text: &str) -> Result<Vec<PathBuf>, DriverError> {
        let asm_file = self.asm_file(class);
        if let Some(parent) = asm_file.parent() {
            std::fs::create_dir_all(parent).map_err(|err| DriverError::io(parent, err))?;
        }
        std::fs::write(&asm_file, text).map_err(|err| DriverError::io(&asm_file, err))?;

        let result = self.run("assemble", &self.assemble, class, &asm_file);
        if let Err(err) = std::fs::remove_file(&asm_file) {
            tracing::warn!(path = %asm_file.display(), error = %err, "failed to remove assembly file");
        }
        let stdout = result?;

        let written: Vec<PathBuf> = stdout
            .lines()
            .filter_map(|line| line.trim().strip_prefix(WRITTEN_PREFIX))
            .map(PathBuf::from)
            .collect();
        if written.is_empty() {
            return Ok(vec![self.class_file(class)]);
        }
        Ok(written)
    }
}
