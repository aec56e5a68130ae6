//! Special member function classification
//!
//! Reduces the front-end's per-member facts to what a binding generator
//! needs: is the member callable, and does calling it do user-visible
//! work. Deletion wins over everything; a member is trivial only when it
//! is implicitly defined or explicitly defaulted *and* trivially
//! generated.

use crate::ast::SpecialMemberFacts;
use crate::ir::{AccessSpecifier, SpecialMemberDefinition, SpecialMemberFunc};

pub(crate) fn classify(
    facts: &SpecialMemberFacts,
    default_access: AccessSpecifier,
) -> SpecialMemberFunc {
    let definition = if facts.deleted {
        SpecialMemberDefinition::Deleted
    } else if !facts.user_provided && facts.trivial {
        SpecialMemberDefinition::Trivial
    } else {
        SpecialMemberDefinition::Nontrivial
    };
    SpecialMemberFunc {
        definition,
        access: facts.access.unwrap_or(default_access),
    }
}
