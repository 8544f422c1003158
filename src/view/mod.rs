//! Headless view-state engine.
//!
//! Every UI element is a struct of exactly the fields that vary across
//! renders, a `render()` that is a pure function of that state, and an
//! `update()` that applies a typed message and returns follow-up commands.
//! Rendering replaces the whole subtree: the returned [`Rendered`] carries
//! both the HTML and the complete set of event bindings for it, and a host
//! swaps the binding set wholesale on every render, so stale listeners cannot
//! accumulate. The driver in [`shell`] executes commands against a
//! [`DataService`](crate::service::DataService) and feeds results back as
//! messages.

pub mod add_meal;
pub mod events;
pub mod product_form;
pub mod search;
pub mod settings;
pub mod shell;
pub mod tracker;

use time::Date;
use uuid::Uuid;

use crate::service::{NewEntry, NewProduct};
use events::DomainEvent;

/// Resolved user identity, passed explicitly down the element tree. There is
/// no process-wide fallback; elements that need the user hold a `Session`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
}

/// Client-side routes. Anything unrecognized renders the not-found page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    Settings,
    NotFound,
}

impl Route {
    pub fn parse(s: &str) -> Route {
        match s {
            "login" => Route::Login,
            "dashboard" => Route::Dashboard,
            "settings" => Route::Settings,
            _ => Route::NotFound,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Route::Login => "login",
            Route::Dashboard => "dashboard",
            Route::Settings => "settings",
            Route::NotFound => "not-found",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Input,
    Change,
    Submit,
}

/// Declarative handler attachment for one node of a rendered subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub target: String,
    pub event: EventKind,
}

impl Binding {
    pub fn new(target: impl Into<String>, event: EventKind) -> Self {
        Self {
            target: target.into(),
            event,
        }
    }
}

/// Output of one render pass: the full HTML subtree plus every binding it
/// needs. Replaces the previous pass entirely.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rendered {
    pub html: String,
    pub bindings: Vec<Binding>,
}

/// A minimal DOM patch for high-frequency inputs (search-as-you-type) where a
/// full re-render would steal focus. Updates a single node's value in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub target: String,
    pub value: String,
}

/// The render half of the element contract. `render` must be idempotent:
/// called twice with unchanged state it yields identical output, with no
/// duplicated bindings.
pub trait View {
    fn render(&self) -> Rendered;
}

/// Side effects requested by an element's `update`. Executed by the shell
/// driver; results come back as messages.
#[derive(Debug, Clone)]
pub enum Cmd {
    /// Fetch entries plus the goal in effect for one calendar day.
    LoadDay { token: u64, date: Date },
    /// Fetch the product catalog (add-meal modal).
    LoadProducts { token: u64 },
    /// Fetch products and goal history (settings page).
    LoadSettings { token: u64 },
    CreateEntry(NewEntry),
    DeleteEntry(Uuid),
    CreateProduct(NewProduct),
    DeleteProduct(Uuid),
    SetGoal(i32),
    /// Fire-and-forget notification on the typed event bus.
    Publish(DomainEvent),
    SignOut,
}
