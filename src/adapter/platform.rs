//! The hosting platform seam.

use mockall::automock;

use crate::{
    adapter::CommandSchema,
    interaction::{Invocation, Reply},
};

/// Operations the hosting chat platform provides.
///
/// A real implementation wraps a chat SDK; tests use the generated
/// `MockPlatform`.
#[automock]
pub trait Platform {
    /// Registers a command with the platform.
    async fn register_command(&self, schema: &CommandSchema) -> anyhow::Result<()>;
    /// Sends the reply of an invocation.
    async fn respond(&self, invocation: &Invocation, reply: &Reply) -> anyhow::Result<()>;
    /// Answers an autocomplete request with suggestions.
    async fn respond_autocomplete(
        &self,
        invocation: &Invocation,
        choices: Vec<String>,
    ) -> anyhow::Result<()>;
}
