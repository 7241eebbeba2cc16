//! Role-based write gates.
//!
//! Every gated store operation consults [`allows`], and presentation layers
//! are expected to consult the same function when deciding what to render,
//! so authorization lives in exactly one place.

use bazaar_types::models::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Submit an asset to the catalog.
    UploadAsset,
    /// Approve or reject pending submissions.
    ModerateAsset,
    /// Create, delete, and assign user tags.
    ManageTags,
    /// Send direct messages with a non-chat kind (info, warning, system,
    /// notification).
    SendTypedMessage,
    /// Delete assets uploaded by someone else.
    DeleteAnyAsset,
    /// Resolve or close tickets the actor does not participate in.
    ManageAnyTicket,
    /// Provision admin accounts.
    CreateAdmin,
}

pub fn allows(role: Role, action: Action) -> bool {
    match action {
        Action::UploadAsset => matches!(role, Role::Creator | Role::Admin | Role::Owner),
        Action::ModerateAsset
        | Action::ManageTags
        | Action::SendTypedMessage
        | Action::DeleteAnyAsset
        | Action::ManageAnyTicket => matches!(role, Role::Admin | Role::Owner),
        Action::CreateAdmin => matches!(role, Role::Owner),
    }
}
