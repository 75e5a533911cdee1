//! Child-process transport.
//!
//! The operation module runs as a child process and speaks the frame
//! protocol of [`opbridge_core::protocol`] over its stdin/stdout. Frames are
//! length-delimited (4-byte big-endian prefix). The transport owns a private
//! current-thread runtime and blocks on it, so callers see a synchronous
//! interface. The module's stderr is inherited for its logs.

use std::process::{ExitStatus, Stdio};

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use opbridge_core::protocol;
use opbridge_core::{ArgumentBag, ExecutionContext, HostFrame, ModuleFrame, ResultHandle};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::runtime::{Builder, Runtime};
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};
use tracing::{debug, info, warn};

use super::{Transport, TransportError};
use crate::config::ProcessConfig;

/// Largest frame either side accepts.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Codec shared by both ends of the child-process protocol.
#[must_use]
pub fn frame_codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .max_frame_length(MAX_FRAME_LEN)
        .new_codec()
}

/// Transport to an operation module running as a child process.
///
/// The child is killed if the transport is dropped without `release`.
pub struct ProcessTransport {
    child: Child,
    writer: Option<FramedWrite<ChildStdin, LengthDelimitedCodec>>,
    reader: FramedRead<ChildStdout, LengthDelimitedCodec>,
    program: String,
    attached: bool,
    released: bool,
    // Dropped last: the pipes and the child are registered with its reactor.
    runtime: Runtime,
}

impl ProcessTransport {
    /// Start the operation module described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Spawn` if the program cannot be started, or
    /// `TransportError::Io` if the runtime cannot be created.
    pub fn spawn(config: &ProcessConfig) -> Result<Self, TransportError> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let program = config.program.display().to_string();

        let mut command = Command::new(&config.program);
        command
            .args(&config.args)
            .envs(config.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(dir) = &config.current_dir {
            command.current_dir(dir);
        }

        let mut child = {
            // Child pipes register with the reactor of the current runtime.
            let _guard = runtime.enter();
            command.spawn().map_err(|source| TransportError::Spawn {
                program: program.clone(),
                source,
            })?
        };
        let stdin = child.stdin.take().ok_or(TransportError::Closed)?;
        let stdout = child.stdout.take().ok_or(TransportError::Closed)?;

        info!(program = %program, pid = ?child.id(), "operation module started");

        Ok(Self {
            child,
            writer: Some(FramedWrite::new(stdin, frame_codec())),
            reader: FramedRead::new(stdout, frame_codec()),
            program,
            attached: false,
            released: false,
            runtime,
        })
    }

    /// OS process id of the module, while it is running.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    fn send(&mut self, frame: &HostFrame) -> Result<(), TransportError> {
        let body = protocol::encode(frame)?;
        let writer = self.writer.as_mut().ok_or(TransportError::Released)?;
        self.runtime.block_on(writer.send(Bytes::from(body)))?;
        Ok(())
    }

    fn receive(&mut self) -> Result<ModuleFrame, TransportError> {
        match self.runtime.block_on(self.reader.next()) {
            Some(Ok(bytes)) => Ok(protocol::decode(&bytes)?),
            Some(Err(err)) => Err(err.into()),
            None => Err(TransportError::Closed),
        }
    }

    fn wait(&mut self) -> Result<ExitStatus, TransportError> {
        Ok(self.runtime.block_on(self.child.wait())?)
    }
}

impl Transport for ProcessTransport {
    fn attach(&mut self, context: &ExecutionContext) -> Result<(), TransportError> {
        if self.released {
            return Err(TransportError::Released);
        }
        self.send(&HostFrame::Init {
            context: context.clone(),
        })?;
        match self.receive()? {
            ModuleFrame::Ready => {
                self.attached = true;
                debug!(program = %self.program, "operation module ready");
                Ok(())
            }
            other => Err(TransportError::UnexpectedFrame {
                expected: "ready",
                received: other.name(),
            }),
        }
    }

    fn invoke(
        &mut self,
        operation: &str,
        args: &ArgumentBag,
    ) -> Result<ResultHandle, TransportError> {
        if self.released {
            return Err(TransportError::Released);
        }
        if !self.attached {
            return Err(TransportError::NotAttached);
        }
        self.send(&HostFrame::Invoke {
            operation: operation.to_string(),
            args: args.clone(),
        })?;
        match self.receive()? {
            ModuleFrame::Outcome { handle } => Ok(handle),
            ModuleFrame::UnknownOperation { name } => {
                Err(TransportError::UnknownOperation { name })
            }
            other @ ModuleFrame::Ready => Err(TransportError::UnexpectedFrame {
                expected: "outcome",
                received: other.name(),
            }),
        }
    }

    fn release(&mut self) -> Result<(), TransportError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.attached = false;

        if let Some(mut writer) = self.writer.take() {
            let body = protocol::encode(&HostFrame::Shutdown)?;
            let sent = self.runtime.block_on(async {
                writer.send(Bytes::from(body)).await?;
                SinkExt::<Bytes>::close(&mut writer).await
            });
            // The module may already have exited; waiting below still reaps it.
            if let Err(err) = sent {
                debug!(program = %self.program, error = %err, "shutdown frame not delivered");
            }
        }

        let status = self.wait()?;
        if status.success() {
            info!(program = %self.program, "operation module exited");
        } else {
            warn!(program = %self.program, %status, "operation module exited abnormally");
        }
        Ok(())
    }
}
