//! Presentation adapter
//!
//! Maps the orchestrator's session onto a plain [`ViewState`] value that any
//! front-end (terminal, web, native) can render, and maps user [`Intent`]s back onto
//! orchestrator commands. Nothing here owns state; a view is recomputed from the
//! session whenever an [`Event`](crate::types::Event) arrives.

mod intent;
mod view;

pub use intent::Intent;
pub use view::{
    COMPLETE_FOOTER, FormatPickerView, Panel, PreviewCard, ProgressView, QualityOption,
    StatusIcon, ViewState,
};
