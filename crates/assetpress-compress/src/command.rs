//! External command backend: source on stdin, result on stdout.

use assetpress_core::ports::Compressor;
use assetpress_core::{Error, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::{Duration, timeout};
use tracing::{debug, warn};

/// Runs a program per compression, feeding the source on stdin.
///
/// A non-zero exit status fails with `Error::Compression` carrying the
/// program's stderr.
#[derive(Debug, Clone)]
pub struct CommandCompressor {
    name: String,
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandCompressor {
    pub fn new(program: impl Into<String>) -> Self {
        let program = program.into();
        Self {
            name: program.clone(),
            program,
            args: vec![],
            timeout: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// `node <bin> [--beautify] --unsafe --max-line-len 4096`
    pub fn uglifyjs(node: &str, bin: &str, debug: bool) -> Self {
        let mut args = vec![bin.to_string()];
        if debug {
            args.push("--beautify".to_string());
        }
        args.extend(["--unsafe", "--max-line-len", "4096"].map(String::from));
        Self::new(node).with_args(args).with_name("uglifyjs")
    }

    /// `java -jar <jar> --compilation_level <level> [--formatting PRETTY_PRINT]`
    pub fn closure_java(java: &str, jar: &str, compilation_level: &str, debug: bool) -> Self {
        let mut args = vec![
            "-jar".to_string(),
            jar.to_string(),
            "--compilation_level".to_string(),
            compilation_level.to_string(),
        ];
        if debug {
            args.extend(["--formatting", "PRETTY_PRINT"].map(String::from));
        }
        Self::new(java).with_args(args).with_name("closure_java")
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    async fn run(&self, source: &str) -> Result<String> {
        debug!(program = %self.program, args = ?self.args, bytes = source.len(), "Spawning compressor");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::Compression(format!("Failed to spawn {}: {}", self.program, e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Compression("Compressor stdin unavailable".to_string()))?;
        let input = source.as_bytes().to_vec();
        let writer = tokio::spawn(async move {
            let result = stdin.write_all(&input).await;
            drop(stdin);
            result
        });

        let output = child.wait_with_output().await.map_err(|e| {
            Error::Compression(format!("Failed to wait for {}: {}", self.program, e))
        })?;

        // A tool that exits early closes its stdin; the exit status decides.
        if let Ok(Err(e)) = writer.await {
            debug!(error = %e, "Compressor closed stdin early");
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Compression(format!(
                "{} exited with {}: {}",
                self.name,
                output.status,
                stderr.trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| Error::Compression(format!("{} produced invalid UTF-8: {}", self.name, e)))
    }
}

#[async_trait]
impl Compressor for CommandCompressor {
    async fn compress(&self, source: &str) -> Result<String> {
        match self.timeout {
            Some(limit) => match timeout(limit, self.run(source)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(backend = %self.name, timeout_ms = limit.as_millis() as u64, "Compressor timed out");
                    Err(Error::Compression(format!(
                        "{} timed out after {:?}",
                        self.name, limit
                    )))
                }
            },
            None => self.run(source).await,
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
