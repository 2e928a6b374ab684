//! Locating the game install: CLI flag, then the remembered directory, then
//! an interactive prompt. Whatever mounts is written back to the state file.

use std::{
    fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::{info, warn};
use visor_assets::PhaseMount;

#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub install_dir: Option<PathBuf>,
    pub state_file: PathBuf,
    pub forget: bool,
}

#[derive(Debug)]
pub enum Resolution {
    Mounted(PhaseMount),
    /// The user declined to name a directory.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Flag,
    Remembered,
    Prompt,
}

pub fn resolve<R, W>(options: &InstallOptions, input: &mut R, output: &mut W) -> Result<Resolution>
where
    R: BufRead,
    W: Write,
{
    if options.forget {
        forget(&options.state_file)?;
    }

    let mut candidate = match &options.install_dir {
        Some(dir) => Some((dir.clone(), Source::Flag)),
        None => read_state(&options.state_file)?.map(|dir| (dir, Source::Remembered)),
    };

    loop {
        let (dir, source) = match candidate.take() {
            Some(found) => found,
            None => match prompt_for_dir(input, output)? {
                Some(dir) => (dir, Source::Prompt),
                None => return Ok(Resolution::Cancelled),
            },
        };

        match PhaseMount::open(&dir) {
            Ok(mount) => {
                info!(
                    "mounted {} phase folder(s) from {}",
                    mount.mounted().len(),
                    dir.display()
                );
                if let Err(err) = write_state(&options.state_file, &dir) {
                    warn!("could not remember install directory: {err:#}");
                }
                return Ok(Resolution::Mounted(mount));
            }
            Err(err) if source == Source::Remembered => {
                warn!("remembered install directory no longer mounts: {err}");
                forget(&options.state_file)?;
            }
            Err(err) => {
                writeln!(output, "Could not mount {}: {err}", dir.display())?;
                if !ask_retry(input, output)? {
                    return Ok(Resolution::Cancelled);
                }
            }
        }
    }
}

fn prompt_for_dir<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Option<PathBuf>> {
    write!(
        output,
        "Directory containing the extracted phase_* folders (empty to quit): "
    )?;
    output.flush()?;
    let answer = read_answer(input)?;
    Ok((!answer.is_empty()).then(|| PathBuf::from(answer)))
}

fn ask_retry<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<bool> {
    write!(output, "[r]etry with another directory or e[x]it? ")?;
    output.flush()?;
    let answer = read_answer(input)?.to_ascii_lowercase();
    Ok(matches!(answer.as_str(), "r" | "retry"))
}

/// One trimmed line; EOF reads as an empty answer.
fn read_answer<R: BufRead>(input: &mut R) -> Result<String> {
    let mut line = String::new();
    input.read_line(&mut line).context("reading from stdin")?;
    Ok(line.trim().to_string())
}

fn read_state(path: &Path) -> Result<Option<PathBuf>> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let dir = contents.trim();
            Ok((!dir.is_empty()).then(|| PathBuf::from(dir)))
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err).with_context(|| format!("reading {}", path.display())),
    }
}

fn write_state(path: &Path, dir: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", dir.display()))
        .with_context(|| format!("writing {}", path.display()))
}

fn forget(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("removing {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn install_root() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("phase_3")).unwrap();
        fs::create_dir_all(dir.path().join("phase_4")).unwrap();
        dir
    }

    fn options(state: &Path, install_dir: Option<&Path>) -> InstallOptions {
        InstallOptions {
            install_dir: install_dir.map(Path::to_path_buf),
            state_file: state.to_path_buf(),
            forget: false,
        }
    }

    fn run(options: &InstallOptions, answers: &str) -> (Resolution, String) {
        let mut input = Cursor::new(answers.as_bytes().to_vec());
        let mut output = Vec::new();
        let resolution = resolve(options, &mut input, &mut output).unwrap();
        (resolution, String::from_utf8(output).unwrap())
    }

    #[test]
    fn prompted_directory_is_remembered() {
        let install = install_root();
        let scratch = tempfile::tempdir().unwrap();
        let state = scratch.path().join("state").join("install_dir.txt");

        let answer = format!("{}\n", install.path().display());
        let (resolution, _) = run(&options(&state, None), &answer);
        assert!(matches!(resolution, Resolution::Mounted(_)));
        assert_eq!(
            fs::read_to_string(&state).unwrap().trim(),
            install.path().display().to_string()
        );

        // the second start goes straight through without prompting
        let (resolution, output) = run(&options(&state, None), "");
        assert!(matches!(resolution, Resolution::Mounted(_)));
        assert!(output.is_empty());
    }

    #[test]
    fn empty_answer_or_eof_cancels() {
        let scratch = tempfile::tempdir().unwrap();
        let state = scratch.path().join("install_dir.txt");

        let (resolution, _) = run(&options(&state, None), "\n");
        assert!(matches!(resolution, Resolution::Cancelled));
        let (resolution, _) = run(&options(&state, None), "");
        assert!(matches!(resolution, Resolution::Cancelled));
        assert!(!state.exists());
    }

    #[test]
    fn stale_remembered_directory_is_dropped_and_reprompted() {
        let scratch = tempfile::tempdir().unwrap();
        let state = scratch.path().join("install_dir.txt");
        let gone = scratch.path().join("gone");
        fs::write(&state, gone.display().to_string()).unwrap();

        let (resolution, output) = run(&options(&state, None), "\n");
        assert!(matches!(resolution, Resolution::Cancelled));
        assert!(output.contains("phase_*"));
        assert!(!state.exists());
    }

    #[test]
    fn bad_flag_offers_retry_then_exit() {
        let install = install_root();
        let scratch = tempfile::tempdir().unwrap();
        let state = scratch.path().join("install_dir.txt");
        let bogus = scratch.path().join("nope");

        let (resolution, output) = run(&options(&state, Some(&bogus)), "x\n");
        assert!(matches!(resolution, Resolution::Cancelled));
        assert!(output.contains("Could not mount"));

        let answers = format!("r\n{}\n", install.path().display());
        let (resolution, _) = run(&options(&state, Some(&bogus)), &answers);
        match resolution {
            Resolution::Mounted(mount) => assert_eq!(mount.root(), install.path()),
            Resolution::Cancelled => panic!("retry should have mounted"),
        }
    }

    #[test]
    fn forget_flag_clears_state_first() {
        let install = install_root();
        let scratch = tempfile::tempdir().unwrap();
        let state = scratch.path().join("install_dir.txt");
        let remembered = install.path().display().to_string();
        fs::write(&state, remembered).unwrap();

        let mut opts = options(&state, None);
        opts.forget = true;
        let (resolution, _) = run(&opts, "\n");
        assert!(matches!(resolution, Resolution::Cancelled));
        assert!(!state.exists());
    }
}
