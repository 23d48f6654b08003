//! SSH command execution using russh crate
//!
//! Every call opens its own authenticated session and closes it once the
//! command finishes; nothing is shared between commands.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use russh::keys::ssh_key;
use russh::keys::{PrivateKeyWithHashAlg, load_secret_key};
use russh::{ChannelMsg, Disconnect, client};
use tokio::time::timeout;
use tracing::{debug, error, instrument, warn};

use crate::error::ExecError;
use crate::keys::Credential;
use crate::result::{CommandResult, HostTarget, Timeouts};
use crate::traits::{RemoteExecutor, program_of};

/// SSH client handler for russh
#[derive(Debug)]
struct SshClientHandler;

impl client::Handler for SshClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &ssh_key::PublicKey,
    ) -> Result<bool, Self::Error> {
        // Accept all server keys (like StrictHostKeyChecking=no)
        Ok(true)
    }
}

type Session = client::Handle<SshClientHandler>;

/// SSH command executor for one host target
#[derive(Debug, Clone)]
pub struct SshExecutor {
    target: HostTarget,
    timeouts: Timeouts,
}

impl SshExecutor {
    /// Create a new SSH executor
    #[must_use]
    pub fn new(target: HostTarget, timeouts: Timeouts) -> Self {
        Self { target, timeouts }
    }

    /// Connect and authenticate within the connect bound
    async fn open_session(&self) -> Result<Session, ExecError> {
        let bound = self.timeouts.connect;
        match timeout(bound, self.connect_and_authenticate()).await {
            Ok(result) => result,
            Err(_) => Err(ExecError::Timeout {
                stage: "connect",
                timeout: bound,
            }),
        }
    }

    async fn connect_and_authenticate(&self) -> Result<Session, ExecError> {
        debug!(
            host = %self.target.address,
            port = self.target.port,
            user = %self.target.user,
            "opening SSH session"
        );

        let config = Arc::new(client::Config::default());
        let mut session = client::connect(
            config,
            (self.target.address.as_str(), self.target.port),
            SshClientHandler,
        )
        .await
        .map_err(|e| ExecError::ConnectionFailed(e.to_string()))?;

        let authenticated = match &self.target.credential {
            Credential::Password(secret) => session
                .authenticate_password(self.target.user.as_str(), secret.expose())
                .await
                .map_err(|e| ExecError::AuthenticationFailed(e.to_string()))?
                .success(),
            key_credential => {
                let resolved = key_credential
                    .resolve_key()
                    .map_err(|e| ExecError::SshKeyError(e.to_string()))?;
                let key_pair = load_secret_key(resolved.path(), None)
                    .map_err(|e| ExecError::SshKeyError(e.to_string()))?;

                let hash_alg = session
                    .best_supported_rsa_hash()
                    .await
                    .ok()
                    .flatten()
                    .flatten();
                session
                    .authenticate_publickey(
                        self.target.user.as_str(),
                        PrivateKeyWithHashAlg::new(Arc::new(key_pair), hash_alg),
                    )
                    .await
                    .map_err(|e| ExecError::AuthenticationFailed(e.to_string()))?
                    .success()
            }
        };

        if !authenticated {
            return Err(ExecError::AuthenticationFailed(format!(
                "{}@{} rejected the credential",
                self.target.user, self.target.address
            )));
        }

        Ok(session)
    }

    /// Run one command on an open session and collect its output
    async fn execute(session: &mut Session, cmd: &str) -> Result<CommandResult, ExecError> {
        let start = Instant::now();

        let mut channel = session
            .channel_open_session()
            .await
            .map_err(|e| ExecError::IoError(e.to_string()))?;

        channel
            .exec(true, cmd)
            .await
            .map_err(|e| ExecError::IoError(e.to_string()))?;

        let mut status = -1;
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        // exit-status may arrive after EOF, so drain until the channel closes
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { data } => stdout.extend_from_slice(&data),
                ChannelMsg::ExtendedData { data, ext: 1 } => stderr.extend_from_slice(&data),
                ChannelMsg::ExitStatus { exit_status } => {
                    status = exit_status.cast_signed();
                }
                _ => {}
            }
        }

        Ok(CommandResult {
            status,
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            duration: start.elapsed(),
        })
    }

    async fn close(&self, session: Session) {
        if let Err(e) = session
            .disconnect(Disconnect::ByApplication, "", "English")
            .await
        {
            warn!(host = %self.target.address, error = %e, "SSH disconnect failed");
        }
    }
}

#[async_trait]
impl RemoteExecutor for SshExecutor {
    async fn run(&self, cmd: &str) -> Result<CommandResult, ExecError> {
        self.run_with_timeout(cmd, self.timeouts.exec).await
    }

    #[instrument(
        skip(self, cmd),
        fields(host = %self.target.address, program = program_of(cmd))
    )]
    async fn run_with_timeout(
        &self,
        cmd: &str,
        timeout_duration: Duration,
    ) -> Result<CommandResult, ExecError> {
        let start = Instant::now();
        let mut session = self.open_session().await?;

        let result = timeout(timeout_duration, Self::execute(&mut session, cmd)).await;
        self.close(session).await;

        match result {
            Ok(Ok(cmd_result)) => {
                debug!(
                    status = cmd_result.status,
                    duration = ?cmd_result.duration,
                    "remote command completed"
                );
                Ok(cmd_result)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => {
                error!(
                    timeout = ?timeout_duration,
                    elapsed = ?start.elapsed(),
                    "remote command timed out"
                );
                Err(ExecError::Timeout {
                    stage: "exec",
                    timeout: timeout_duration,
                })
            }
        }
    }

    fn executor_type(&self) -> &'static str {
        "ssh"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Secret;

    #[tokio::test]
    async fn test_unreachable_host_fails_within_connect_bound() {
        // TEST-NET-1 is guaranteed unroutable
        let target = HostTarget::new("192.0.2.1", Credential::Password(Secret::new("pw")));
        let executor = SshExecutor::new(
            target,
            Timeouts {
                connect: Duration::from_millis(200),
                exec: Duration::from_secs(1),
            },
        );

        let started = Instant::now();
        let err = executor.exec("true").await.unwrap_err();

        assert!(err.is_connection_error());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_refused_port_is_connection_error() {
        let target = HostTarget::new("127.0.0.1", Credential::Password(Secret::new("pw")))
            .with_port(1);
        let executor = SshExecutor::new(target, Timeouts::default());

        let err = executor.exec("true").await.unwrap_err();
        assert!(err.is_connection_error());
    }

    #[tokio::test]
    #[ignore = "requires SSH server"]
    async fn test_ssh_roundtrip() {
        let password = std::env::var("STREAMPROV_TEST_SSH_PASSWORD").unwrap();
        let target = HostTarget::new("127.0.0.1", Credential::Password(Secret::new(password)));
        let executor = SshExecutor::new(target, Timeouts::default());

        let out = executor.exec("echo ok").await.unwrap();
        assert_eq!(out.trim(), "ok");
    }
}
