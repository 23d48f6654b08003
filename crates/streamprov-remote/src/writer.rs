//! Remote File Writer
//!
//! Places file bodies on the host with one of two strategies, falling back to
//! the other if the first fails, then relaxes the file mode and confirms the
//! file is listed.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use streamprov_exec::RemoteExecutor;
use streamprov_template::{ConfigArtifact, TransferStrategy};
use tracing::{debug, instrument, warn};

use crate::commands;
use crate::error::RemoteError;
use crate::probe::Presence;

/// Mode applied to every written file
pub const DEFAULT_FILE_MODE: u32 = 0o777;

/// Writes files on one host
pub struct RemoteFileWriter {
    executor: Arc<dyn RemoteExecutor>,
}

impl RemoteFileWriter {
    pub fn new(executor: Arc<dyn RemoteExecutor>) -> Self {
        Self { executor }
    }

    /// Write one artifact below `dir`
    ///
    /// # Errors
    /// See [`RemoteFileWriter::write`]
    pub async fn write_artifact(
        &self,
        dir: &str,
        artifact: &ConfigArtifact,
    ) -> Result<TransferStrategy, RemoteError> {
        let path = format!("{dir}/{}", artifact.relative_path);
        self.write(&path, &artifact.content, artifact.strategy).await
    }

    /// Write `content` to `path`, trying `preferred` first
    ///
    /// Returns the strategy that actually placed the file.
    ///
    /// # Errors
    /// `WriteFailed` if both strategies fail, `Exec` if the mode change or
    /// read-back cannot run, `Verification` if the file is not listed after
    /// the write
    #[instrument(skip(self, content), fields(bytes = content.len()))]
    pub async fn write(
        &self,
        path: &str,
        content: &[u8],
        preferred: TransferStrategy,
    ) -> Result<TransferStrategy, RemoteError> {
        let fallback = match preferred {
            TransferStrategy::Primary => TransferStrategy::Fallback,
            TransferStrategy::Fallback => TransferStrategy::Primary,
        };

        let used = match self.place(path, content, preferred).await {
            Ok(()) => preferred,
            Err(first) => {
                warn!(strategy = ?preferred, error = %first, "write failed, trying {fallback:?}");
                match self.place(path, content, fallback).await {
                    Ok(()) => fallback,
                    Err(second) => {
                        let (primary, fallback) = match preferred {
                            TransferStrategy::Primary => (first, second),
                            TransferStrategy::Fallback => (second, first),
                        };
                        return Err(RemoteError::WriteFailed {
                            path: path.to_string(),
                            primary,
                            fallback,
                        });
                    }
                }
            }
        };

        self.executor.exec(&commands::chmod(DEFAULT_FILE_MODE, path)).await?;
        self.verify(path).await?;

        debug!(strategy = ?used, "file written");
        Ok(used)
    }

    /// Confirm `path` is listed on the host
    ///
    /// # Errors
    /// `Verification` if it is not
    pub async fn verify(&self, path: &str) -> Result<(), RemoteError> {
        let output = self.executor.exec(&commands::listed(path)).await?;
        match Presence::parse("listing", &output)? {
            Presence::Exists => Ok(()),
            Presence::Missing => Err(RemoteError::Verification(format!(
                "{path} missing after write"
            ))),
        }
    }

    async fn place(
        &self,
        path: &str,
        content: &[u8],
        strategy: TransferStrategy,
    ) -> Result<(), String> {
        let cmd = match strategy {
            TransferStrategy::Primary => commands::write_base64(&STANDARD.encode(content), path),
            TransferStrategy::Fallback => {
                let text = std::str::from_utf8(content)
                    .map_err(|_| "content is not valid UTF-8".to_string())?;
                commands::write_literal(text, path)
            }
        };

        self.executor
            .exec(&cmd)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::os::unix::fs::PermissionsExt;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use streamprov_exec::{CommandResult, ExecError, LocalExecutor};

    use super::*;

    /// Local executor whose base64 decoder is broken
    struct NoDecoder {
        inner: LocalExecutor,
    }

    #[async_trait]
    impl RemoteExecutor for NoDecoder {
        async fn run(&self, cmd: &str) -> Result<CommandResult, ExecError> {
            self.run_with_timeout(cmd, Duration::from_secs(10)).await
        }

        async fn run_with_timeout(
            &self,
            cmd: &str,
            timeout: Duration,
        ) -> Result<CommandResult, ExecError> {
            if cmd.contains("base64 -d") {
                return Ok(CommandResult {
                    status: 127,
                    stdout: String::new(),
                    stderr: "base64: command not found".to_string(),
                    duration: Duration::ZERO,
                });
            }
            self.inner.run_with_timeout(cmd, timeout).await
        }

        fn executor_type(&self) -> &'static str {
            "no-decoder"
        }
    }

    /// Answers every command with the same stdout
    struct Canned {
        stdout: &'static str,
        issued: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl RemoteExecutor for Canned {
        async fn run(&self, cmd: &str) -> Result<CommandResult, ExecError> {
            self.run_with_timeout(cmd, Duration::ZERO).await
        }

        async fn run_with_timeout(
            &self,
            cmd: &str,
            _timeout: Duration,
        ) -> Result<CommandResult, ExecError> {
            self.issued.lock().unwrap().push(cmd.to_string());
            Ok(CommandResult {
                status: 0,
                stdout: self.stdout.to_string(),
                stderr: String::new(),
                duration: Duration::ZERO,
            })
        }

        fn executor_type(&self) -> &'static str {
            "canned"
        }
    }

    const AWKWARD: &str = "cost: $HOME \\n 'quoted' \"double\" `tick` \\\\ ${Stream.Name}\nline two\n";

    #[tokio::test]
    async fn test_primary_write_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Application.xml");
        let path = path.to_str().unwrap();

        let writer = RemoteFileWriter::new(Arc::new(LocalExecutor::default()));
        let used = writer
            .write(path, AWKWARD.as_bytes(), TransferStrategy::Primary)
            .await
            .unwrap();

        assert_eq!(used, TransferStrategy::Primary);
        assert_eq!(std::fs::read(path).unwrap(), AWKWARD.as_bytes());

        let mode = std::fs::metadata(path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, DEFAULT_FILE_MODE);
    }

    #[tokio::test]
    async fn test_fallback_write_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("publish.password");
        let path = path.to_str().unwrap();

        let writer = RemoteFileWriter::new(Arc::new(NoDecoder {
            inner: LocalExecutor::default(),
        }));
        let used = writer
            .write(path, AWKWARD.as_bytes(), TransferStrategy::Primary)
            .await
            .unwrap();

        assert_eq!(used, TransferStrategy::Fallback);
        assert_eq!(std::fs::read(path).unwrap(), AWKWARD.as_bytes());
    }

    #[tokio::test]
    async fn test_both_strategies_fail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        let path = path.to_str().unwrap();

        let writer = RemoteFileWriter::new(Arc::new(NoDecoder {
            inner: LocalExecutor::default(),
        }));
        let err = writer
            .write(path, &[0xff, 0xfe, 0x00], TransferStrategy::Primary)
            .await
            .unwrap_err();

        match err {
            RemoteError::WriteFailed { primary, fallback, .. } => {
                assert!(primary.contains("base64"));
                assert!(fallback.contains("UTF-8"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_after_write_is_verification_error() {
        let executor = Arc::new(Canned {
            stdout: "not found\n",
            issued: Mutex::new(Vec::new()),
        });
        let writer = RemoteFileWriter::new(executor.clone());

        let err = writer
            .write("/conf/acct1/aliasmap.play.txt", b"acct1=x", TransferStrategy::Fallback)
            .await
            .unwrap_err();

        assert!(err.is_verification());
        let issued = executor.issued.lock().unwrap();
        assert_eq!(issued.len(), 3);
        assert!(issued[0].starts_with("printf '%s' "));
        assert_eq!(issued[1], "chmod 777 /conf/acct1/aliasmap.play.txt");
        assert!(issued[2].starts_with("ls -la "));
    }
}
