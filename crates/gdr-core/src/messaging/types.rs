/// Outgoing "chat action" (status indicator shown while we work).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatAction {
    UploadDocument,
}

/// Capabilities of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub supports_chat_actions: bool,
}
