//! `opbridge` Core: argument bags, result handles, the operation catalog and wire frames.

pub mod bag;
pub mod catalog;
pub mod context;
pub mod outcome;
pub mod params;
pub mod protocol;
pub mod router;
pub mod value;

pub use bag::{ArgValue, ArgumentBag};
pub use catalog::{keys, OperationKind, ReturnShape, UnknownOperationName};
pub use context::ExecutionContext;
pub use outcome::{ContractViolation, Outcome, RemoteError, ResultHandle};
pub use params::OperationParams;
pub use protocol::{CodecError, HostFrame, ModuleFrame};
pub use router::{DispatchError, HandlerRouter, OperationHandler};
pub use value::{Mapping, Value};
