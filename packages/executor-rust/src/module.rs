//! Module side of the child-process protocol.
//!
//! An operation module binary builds a `HandlerRouter` and hands it to
//! [`serve`] together with its stdin/stdout.

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use opbridge_core::protocol;
use opbridge_core::{DispatchError, ExecutionContext, HandlerRouter, HostFrame, ModuleFrame};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, warn};

use crate::transport::process::frame_codec;
use crate::transport::TransportError;

/// Answer host frames from `reader` on `writer` until shutdown or end of stream.
///
/// # Errors
///
/// Returns `TransportError::UnexpectedFrame` if the host breaks the session
/// order, and I/O or codec errors from the streams.
pub async fn serve<R, W>(
    mut router: HandlerRouter,
    reader: R,
    writer: W,
) -> Result<(), TransportError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut inbound = FramedRead::new(reader, frame_codec());
    let mut outbound = FramedWrite::new(writer, frame_codec());
    let mut context: Option<ExecutionContext> = None;

    while let Some(bytes) = inbound.next().await {
        let frame: HostFrame = protocol::decode(&bytes?)?;
        let reply = match frame {
            HostFrame::Init { context: received } => {
                if context.is_some() {
                    return Err(TransportError::UnexpectedFrame {
                        expected: "invoke",
                        received: "init",
                    });
                }
                info!(
                    target_name = %received.target_name,
                    project_dir = %received.project_dir.display(),
                    "execution context attached"
                );
                context = Some(received);
                ModuleFrame::Ready
            }
            HostFrame::Invoke { operation, args } => {
                let ctx = context.as_ref().ok_or(TransportError::UnexpectedFrame {
                    expected: "init",
                    received: "invoke",
                })?;
                match router.dispatch(ctx, &operation, &args) {
                    Ok(handle) => ModuleFrame::Outcome { handle },
                    Err(DispatchError::UnknownOperation { name }) => {
                        warn!(operation = %name, "unknown operation requested");
                        ModuleFrame::UnknownOperation { name }
                    }
                }
            }
            HostFrame::Shutdown => {
                debug!("shutdown requested");
                break;
            }
        };
        outbound.send(Bytes::from(protocol::encode(&reply)?)).await?;
    }

    SinkExt::<Bytes>::flush(&mut outbound).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use opbridge_core::{ArgumentBag, OperationKind, RemoteError, ResultHandle, Value};
    use tokio::io::{duplex, DuplexStream};

    use super::*;

    type HostWriter = FramedWrite<DuplexStream, tokio_util::codec::LengthDelimitedCodec>;
    type HostReader = FramedRead<DuplexStream, tokio_util::codec::LengthDelimitedCodec>;

    fn make_ctx() -> ExecutionContext {
        ExecutionContext {
            target_name: "Blog".to_string(),
            startup_target_name: "Blog".to_string(),
            app_base_path: PathBuf::from("/blog/bin"),
            working_dir: PathBuf::from("/blog"),
            project_dir: PathBuf::from("/blog"),
            root_namespace: "Blog".to_string(),
            language: None,
        }
    }

    fn router() -> HandlerRouter {
        let mut router = HandlerRouter::new();
        router.register_fn(OperationKind::ScriptDbContext, |ctx, _| {
            Ok(Value::String(format!("-- {}", ctx.target_name)))
        });
        router.register_fn(OperationKind::DropDatabase, |_, _| {
            Err(RemoteError::new("DbException", "cannot drop", "at drop"))
        });
        router
    }

    /// Start `serve` on one end of an in-memory pipe; return the host end.
    fn start() -> (HostWriter, HostReader, tokio::task::JoinHandle<Result<(), TransportError>>) {
        let (host_to_module, module_in) = duplex(64 * 1024);
        let (module_out, module_to_host) = duplex(64 * 1024);
        let server = tokio::spawn(serve(router(), module_in, module_out));
        (
            FramedWrite::new(host_to_module, frame_codec()),
            FramedRead::new(module_to_host, frame_codec()),
            server,
        )
    }

    async fn send(writer: &mut HostWriter, frame: &HostFrame) {
        writer
            .send(Bytes::from(protocol::encode(frame).unwrap()))
            .await
            .unwrap();
    }

    async fn recv(reader: &mut HostReader) -> ModuleFrame {
        let bytes = reader.next().await.unwrap().unwrap();
        protocol::decode(&bytes).unwrap()
    }

    fn invoke(operation: &str) -> HostFrame {
        HostFrame::Invoke {
            operation: operation.to_string(),
            args: ArgumentBag::new(),
        }
    }

    #[tokio::test]
    async fn full_session() {
        let (mut tx, mut rx, server) = start();

        send(&mut tx, &HostFrame::Init { context: make_ctx() }).await;
        assert_eq!(recv(&mut rx).await, ModuleFrame::Ready);

        send(&mut tx, &invoke("ScriptDbContext")).await;
        assert_eq!(
            recv(&mut rx).await,
            ModuleFrame::Outcome {
                handle: ResultHandle::success(Value::from("-- Blog"))
            }
        );

        send(&mut tx, &invoke("DropDatabase")).await;
        match recv(&mut rx).await {
            ModuleFrame::Outcome { handle } => {
                assert_eq!(handle.error_kind.as_deref(), Some("DbException"));
            }
            other => panic!("unexpected frame {}", other.name()),
        }

        send(&mut tx, &invoke("Vacuum")).await;
        assert_eq!(
            recv(&mut rx).await,
            ModuleFrame::UnknownOperation {
                name: "Vacuum".to_string()
            }
        );

        send(&mut tx, &HostFrame::Shutdown).await;
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn invoke_before_init_is_rejected() {
        let (mut tx, _rx, server) = start();
        send(&mut tx, &invoke("ScriptDbContext")).await;
        let err = server.await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            TransportError::UnexpectedFrame {
                expected: "init",
                received: "invoke"
            }
        ));
    }

    #[tokio::test]
    async fn end_of_stream_ends_session() {
        let (tx, _rx, server) = start();
        drop(tx);
        server.await.unwrap().unwrap();
    }
}
