//! Component selection provider seam (design note §9).
//!
//! The interactive TTY list widget is an external collaborator, out of scope
//! per spec §1 — only its interface is specified here.

use std::collections::BTreeSet;

use crate::components::ComponentId;
use crate::error::EngineError;

pub trait SelectionProvider {
    fn provide_selection(&self) -> eyre::Result<BTreeSet<ComponentId>>;
}

/// Stand-in for the real TTY widget. Reaching this is a programming error in
/// this crate (the CLI must always pass `--skip-selector` or a scripted
/// provider until the interactive widget is wired up elsewhere).
pub struct UnimplementedSelector;

impl SelectionProvider for UnimplementedSelector {
    fn provide_selection(&self) -> eyre::Result<BTreeSet<ComponentId>> {
        Err(EngineError::Internal(
            "interactive component selector is not implemented in this crate".to_string(),
        )
        .into())
    }
}

/// A fixed selection, used by `--skip-selector` and by tests.
pub struct ScriptedSelector(pub BTreeSet<ComponentId>);

impl SelectionProvider for ScriptedSelector {
    fn provide_selection(&self) -> eyre::Result<BTreeSet<ComponentId>> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_selector_returns_fixed_set() {
        let selection: BTreeSet<_> = [ComponentId::Claude].into_iter().collect();
        let provider = ScriptedSelector(selection.clone());
        assert_eq!(provider.provide_selection().unwrap(), selection);
    }

    #[test]
    fn unimplemented_selector_errors() {
        assert!(UnimplementedSelector.provide_selection().is_err());
    }
}
