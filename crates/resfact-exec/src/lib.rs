//! resfact-exec: Local command execution
//!
//! Providers that need an external program (service manager, package
//! database) go through [`CommandRunner`] so they can be faked in tests.

pub mod error;
pub mod local;
pub mod result;
pub mod traits;

pub use error::ExecError;
pub use local::LocalRunner;
pub use result::CommandOutput;
pub use traits::CommandRunner;
