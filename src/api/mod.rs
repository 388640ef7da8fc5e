//! Purpose: Define the public Rust API boundary for domreg.
//! Exports: Remote client, session state, shaped queries, core reply types.
//! Role: The only public path to transport and decoding primitives.
//! Invariants: Internal core modules are re-exported here, not reached around.

mod query;
mod remote;
mod session;

pub use crate::core::decode::decode;
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::reply::{Reply, ReplyHead};
pub use crate::core::value::{Node, ResultTree};
pub use query::{DomainInfo, domain_info, domain_list, indexed_values};
pub use remote::RemoteClient;
pub use session::Session;

pub type ApiResult<T> = Result<T, Error>;
