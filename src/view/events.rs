use crate::changes::ChangeKind;

use super::Route;

/// Application-wide notifications. A closed enum instead of string topics,
/// so payload shapes are enforced by the type system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    EntriesUpdated,
    GoalsUpdated,
    ProductsUpdated,
    RouteChange(Route),
    ProductSearch(String),
    ProductFormSubmit { name: String, calories_per_100g: i32 },
}

impl From<ChangeKind> for DomainEvent {
    fn from(kind: ChangeKind) -> Self {
        match kind {
            ChangeKind::Products => DomainEvent::ProductsUpdated,
            ChangeKind::Entries => DomainEvent::EntriesUpdated,
            ChangeKind::Goals => DomainEvent::GoalsUpdated,
        }
    }
}
