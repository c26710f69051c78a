//! Parent/child selection for hierarchical search.
//!
//! `NoParent` → `ParentSelected` on `select_parent` (also from
//! `ParentSelected`, replacing the parent) and back on `reset`. Children
//! accumulate only while a parent is selected. Clearing the query text on a
//! parent change is the session's job; this type only tracks selections.

use cardsearch_core::autofill::AutofillFields;
use cardsearch_core::{Error, HierarchyMode, Result, SearchResult};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    NoParent,
    ParentSelected,
}

/// Payload handed to the autofill callback after a selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Autofill {
    Parent { parent: SearchResult, fields: AutofillFields },
    Child { parent: SearchResult, child: SearchResult, fields: AutofillFields },
}

impl Autofill {
    pub fn fields(&self) -> &AutofillFields {
        match self {
            Self::Parent { fields, .. } | Self::Child { fields, .. } => fields,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HierarchicalState {
    mode: HierarchyMode,
    parent_selected: Option<SearchResult>,
    child_results: Vec<SearchResult>,
}

impl HierarchicalState {
    pub fn new(mode: HierarchyMode) -> Self { Self { mode, parent_selected: None, child_results: Vec::new() } }

    pub fn mode(&self) -> HierarchyMode { self.mode }

    pub fn phase(&self) -> Phase {
        if self.parent_selected.is_some() { Phase::ParentSelected } else { Phase::NoParent }
    }

    pub fn parent(&self) -> Option<&SearchResult> { self.parent_selected.as_ref() }

    pub fn children(&self) -> &[SearchResult] { &self.child_results }

    pub fn select_parent(&mut self, parent: SearchResult) -> Autofill {
        self.child_results.clear();
        self.parent_selected = Some(parent.clone());
        let fields = AutofillFields::from_result(&parent);
        Autofill::Parent { parent, fields }
    }

    pub fn select_child(&mut self, child: SearchResult) -> Result<Autofill> {
        let parent = self.parent_selected.clone().ok_or(Error::NoParentSelected)?;
        self.child_results.push(child.clone());
        let fields = AutofillFields::from_result(&child).or(AutofillFields::from_result(&parent));
        Ok(Autofill::Child { parent, child, fields })
    }

    pub fn reset(&mut self) {
        self.parent_selected = None;
        self.child_results.clear();
    }
}
