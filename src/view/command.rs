//! Inbound commands from the surface and the host.

use crate::storage::EntryId;

/// Part of an entry that was clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Entry,
    TitleLink,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Auxiliary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewCommand {
    /// The surface finished loading after a `Reset` and can be built.
    Loaded,
    Scrolled,
    SetRead { id: EntryId, read: bool },
    SetStarred { id: EntryId, starred: bool },
    Delete { id: EntryId },
    Restore { id: EntryId },
    /// The surface collapsed or expanded an entry on its own.
    CollapseToggled { id: EntryId, collapsed: bool },
    Click {
        id: EntryId,
        target: ClickTarget,
        button: PointerButton,
    },
    SelectNext,
    SelectPrev,
    NextPage,
    PrevPage,
}
