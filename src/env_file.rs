//! `.env` loading for the binary: `--env-file <path>` on the command line, or `./.env`.

use log::info;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct LoadedEnvFile {
    pub path: PathBuf,
    pub explicit: bool,
}

/// Pick the env file from the command line arguments (program name already skipped).
pub fn env_file_from_args<I>(args: I) -> Result<Option<PathBuf>, String>
where
    I: IntoIterator<Item = std::ffi::OsString>,
{
    let mut args = args.into_iter();
    let mut env_file: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        let value = match arg.to_str() {
            Some("--env-file") => args
                .next()
                .map(PathBuf::from)
                .ok_or_else(|| "`--env-file` requires a path argument".to_string())?,
            Some(s) if s.starts_with("--env-file=") => {
                let path = &s["--env-file=".len()..];
                if path.is_empty() {
                    return Err("`--env-file` requires a path argument".to_string());
                }
                PathBuf::from(path)
            }
            Some("--") => break,
            Some(other) => return Err(format!("unrecognised argument: {}", other)),
            None => return Err("argument contains invalid UTF-8".to_string()),
        };
        if env_file.replace(value).is_some() {
            return Err("`--env-file` provided more than once".to_string());
        }
    }

    Ok(env_file)
}

/// Load the file named on the command line, or `./.env` when present.
pub fn configure_env_from_cli() -> Result<Option<LoadedEnvFile>, String> {
    match env_file_from_args(std::env::args_os().skip(1))? {
        Some(path) => {
            if !path.is_file() {
                return Err(format!("env file not found: {}", path.display()));
            }
            load_env_file(&path)?;
            Ok(Some(LoadedEnvFile { path, explicit: true }))
        }
        None => {
            let cwd = std::env::current_dir().map_err(|e| format!("unable to read current directory: {}", e))?;
            let path = cwd.join(".env");
            if !path.is_file() {
                return Ok(None);
            }
            load_env_file(&path)?;
            Ok(Some(LoadedEnvFile { path, explicit: false }))
        }
    }
}

/// Apply the env file, then start `env_logger` so a `RUST_LOG` set in the file is honoured.
pub fn init_env_and_logging() -> Result<Option<LoadedEnvFile>, String> {
    let loaded = configure_env_from_cli()?;

    let default_filter = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(default_filter)
        .format_timestamp_secs()
        .init();

    if let Some(env_file) = loaded.as_ref() {
        info!("Environment loaded from {}", env_file.describe());
    }
    Ok(loaded)
}

impl LoadedEnvFile {
    pub fn describe(&self) -> String {
        let origin = if self.explicit { "CLI-specified" } else { "default" };
        format!("{} .env file: {}", origin, self.path.display())
    }
}

fn load_env_file(path: &Path) -> Result<(), String> {
    let contents = std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    for (key, value) in parse_env_file(&contents).map_err(|e| format!("{}:{}", path.display(), e))? {
        // Variables already in the process environment win.
        if std::env::var_os(&key).is_none() {
            // Updating process-level environment variables is unsafe on some targets.
            unsafe {
                std::env::set_var(key, value);
            }
        }
    }
    Ok(())
}

/// Parse the whole file; errors are prefixed with the 1-based line number.
pub fn parse_env_file(contents: &str) -> Result<Vec<(String, String)>, String> {
    let mut pairs = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        if let Some(pair) = parse_env_assignment(line).map_err(|e| format!("{}: {}", index + 1, e))? {
            pairs.push(pair);
        }
    }
    Ok(pairs)
}

fn parse_env_assignment(line: &str) -> Result<Option<(String, String)>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let assignment = trimmed
        .strip_prefix("export ")
        .map(str::trim_start)
        .unwrap_or(trimmed);
    let (key, raw_value) = assignment
        .split_once('=')
        .ok_or_else(|| "missing '=' in assignment".to_string())?;

    let key = key.trim();
    if key.is_empty() {
        return Err("environment variable name cannot be empty".to_string());
    }
    if key.chars().any(char::is_whitespace) {
        return Err(format!("environment variable name contains whitespace: {}", key));
    }

    Ok(Some((key.to_string(), parse_env_value(raw_value)?)))
}

fn parse_env_value(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    let Some(quote) = trimmed.chars().next().filter(|c| *c == '"' || *c == '\'') else {
        // bare value: an unquoted `#` starts a comment
        let value = trimmed.split('#').next().unwrap_or_default().trim_end();
        return Ok(value.to_string());
    };

    let mut value = String::new();
    let mut chars = trimmed[1..].chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if quote == '"' => {
                let escaped = chars
                    .next()
                    .ok_or_else(|| "unterminated escape sequence in double-quoted value".to_string())?;
                value.push(match escaped {
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    other => other,
                });
            }
            c if c == quote => {
                let rest = chars.as_str().trim();
                if rest.is_empty() || rest.starts_with('#') {
                    return Ok(value);
                }
                return Err("unexpected characters after closing quote".to_string());
            }
            other => value.push(other),
        }
    }

    Err(if quote == '"' {
        "unterminated double-quoted value".to_string()
    } else {
        "unterminated single-quoted value".to_string()
    })
}
