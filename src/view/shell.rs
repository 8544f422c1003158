use std::collections::VecDeque;

use tokio::sync::broadcast;
use tracing::warn;

use crate::{
    changes::ChangeKind,
    service::DataService,
    view::events::DomainEvent,
};

use super::{
    add_meal::{AddMealEntry, AddMealMsg},
    product_form::ProductFormMsg,
    settings::{SettingsMsg, SettingsPage},
    tracker::{CalorieTracker, TrackerMsg},
    Binding, Cmd, EventKind, Rendered, Route, Session, View,
};

pub enum Page {
    Login,
    Dashboard {
        tracker: CalorieTracker,
        add_meal: AddMealEntry,
    },
    Settings(SettingsPage),
    NotFound,
}

/// Application root. Owns the session, routes between pages, and runs the
/// command loop that connects elements to the [`DataService`].
pub struct AppShell {
    session: Option<Session>,
    route: Route,
    page: Page,
    // Held for the lifetime of the session; dropping it on sign-out releases
    // the change-feed subscription.
    changes: Option<broadcast::Receiver<ChangeKind>>,
}

#[derive(Debug, Clone)]
pub enum AppMsg {
    /// Result of session resolution at startup or after login.
    AuthResolved(Option<Session>),
    Logout,
    SignedOut,
    Navigate(Route),
    Domain(DomainEvent),
    Tracker(TrackerMsg),
    AddMeal(AddMealMsg),
    Settings(SettingsMsg),
}

impl Default for AppShell {
    fn default() -> Self {
        Self::new()
    }
}

impl AppShell {
    pub fn new() -> Self {
        Self {
            session: None,
            route: Route::Login,
            page: Page::Login,
            changes: None,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    fn navigate(&mut self, route: Route) -> Vec<Cmd> {
        let Some(session) = self.session.clone() else {
            self.route = Route::Login;
            self.page = Page::Login;
            return Vec::new();
        };
        self.route = route;
        match route {
            Route::Login | Route::Dashboard => {
                self.route = Route::Dashboard;
                let (tracker, cmds) = CalorieTracker::mount(session);
                self.page = Page::Dashboard {
                    tracker,
                    add_meal: AddMealEntry::new(),
                };
                cmds
            }
            Route::Settings => {
                let (page, cmds) = SettingsPage::mount(session);
                self.page = Page::Settings(page);
                cmds
            }
            Route::NotFound => {
                self.page = Page::NotFound;
                Vec::new()
            }
        }
    }

    pub fn update(&mut self, msg: AppMsg) -> Vec<Cmd> {
        match msg {
            AppMsg::AuthResolved(session) => {
                self.session = session;
                if self.session.is_some() {
                    self.navigate(Route::Dashboard)
                } else {
                    self.navigate(Route::Login)
                }
            }
            AppMsg::Logout => vec![Cmd::SignOut],
            AppMsg::SignedOut => {
                self.session = None;
                self.changes = None;
                self.navigate(Route::Login)
            }
            AppMsg::Navigate(route) => self.navigate(route),
            AppMsg::Domain(event) => self.apply_domain_event(event),
            AppMsg::Tracker(msg) => match &mut self.page {
                Page::Dashboard { tracker, .. } => tracker.update(msg),
                _ => Vec::new(),
            },
            AppMsg::AddMeal(msg) => match &mut self.page {
                Page::Dashboard { tracker, add_meal } => {
                    add_meal.update(msg, tracker.selected_date)
                }
                _ => Vec::new(),
            },
            AppMsg::Settings(msg) => match &mut self.page {
                Page::Settings(page) => page.update(msg),
                _ => Vec::new(),
            },
        }
    }

    /// React to a typed notification: data-changed events reload whichever
    /// page displays that data, route changes navigate, the rest are
    /// informational.
    fn apply_domain_event(&mut self, event: DomainEvent) -> Vec<Cmd> {
        match event {
            DomainEvent::EntriesUpdated | DomainEvent::GoalsUpdated => match &mut self.page {
                Page::Dashboard { tracker, .. } => tracker.update(TrackerMsg::Reload),
                Page::Settings(page) if event == DomainEvent::GoalsUpdated => {
                    page.update(SettingsMsg::Reload)
                }
                _ => Vec::new(),
            },
            DomainEvent::ProductsUpdated => match &mut self.page {
                Page::Settings(page) => page.update(SettingsMsg::Reload),
                _ => Vec::new(),
            },
            DomainEvent::RouteChange(route) => self.navigate(route),
            DomainEvent::ProductSearch(_) | DomainEvent::ProductFormSubmit { .. } => Vec::new(),
        }
    }

    /// Drive one message to quiescence: apply it, execute the commands it
    /// produced, and feed results back until no commands remain.
    pub async fn dispatch(&mut self, svc: &dyn DataService, msg: AppMsg) {
        if let AppMsg::AuthResolved(Some(session)) = &msg {
            self.changes = Some(svc.subscribe(session.user_id));
        }

        let mut queue = VecDeque::from([msg]);
        while let Some(msg) = queue.pop_front() {
            for cmd in self.update(msg) {
                if let Some(followup) = self.run_cmd(svc, cmd).await {
                    queue.push_back(followup);
                }
            }
        }
    }

    /// Drain pending change-feed notifications into messages. A host calls
    /// this when the feed wakes, then dispatches each message.
    pub fn pump_changes(&mut self) -> Vec<AppMsg> {
        let Some(rx) = &mut self.changes else {
            return Vec::new();
        };
        let mut msgs = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(kind) => msgs.push(AppMsg::Domain(kind.into())),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        msgs
    }

    async fn run_cmd(&mut self, svc: &dyn DataService, cmd: Cmd) -> Option<AppMsg> {
        let user_id = match (&self.session, &cmd) {
            (_, Cmd::Publish(_) | Cmd::SignOut) => None,
            (Some(session), _) => Some(session.user_id),
            (None, _) => {
                warn!("dropping data command issued without a session");
                return None;
            }
        };

        match cmd {
            Cmd::LoadDay { token, date } => {
                let user_id = user_id?;
                // Failed reads degrade to an empty day rather than blocking
                // the page.
                let entries = svc.list_entries(user_id, date).await.unwrap_or_else(|e| {
                    warn!(error = %e, "failed to load entries");
                    Vec::new()
                });
                let goal = svc.goal_for_date(user_id, date).await.unwrap_or_else(|e| {
                    warn!(error = %e, "failed to load goal");
                    None
                });
                Some(AppMsg::Tracker(TrackerMsg::DayLoaded {
                    token,
                    entries,
                    goal,
                }))
            }
            Cmd::LoadProducts { token } => {
                let result = svc
                    .list_products(user_id?)
                    .await
                    .map_err(|e| e.to_string());
                Some(AppMsg::AddMeal(AddMealMsg::ProductsLoaded { token, result }))
            }
            Cmd::LoadSettings { token } => {
                let user_id = user_id?;
                let products = svc.list_products(user_id).await.unwrap_or_else(|e| {
                    warn!(error = %e, "failed to load products");
                    Vec::new()
                });
                let goals = svc.goal_history(user_id).await.unwrap_or_else(|e| {
                    warn!(error = %e, "failed to load goal history");
                    crate::service::GoalHistory {
                        current: None,
                        history: Vec::new(),
                    }
                });
                Some(AppMsg::Settings(SettingsMsg::Loaded {
                    token,
                    products,
                    goals,
                }))
            }
            Cmd::CreateEntry(new) => {
                let result = svc
                    .create_entry(user_id?, new)
                    .await
                    .map(|_| ())
                    .map_err(|e| e.to_string());
                Some(AppMsg::AddMeal(AddMealMsg::Saved(result)))
            }
            Cmd::DeleteEntry(id) => {
                let result = svc
                    .delete_entry(user_id?, id)
                    .await
                    .map_err(|e| e.to_string());
                Some(AppMsg::Tracker(TrackerMsg::Deleted(result)))
            }
            Cmd::CreateProduct(new) => {
                let result = svc
                    .create_product(user_id?, new)
                    .await
                    .map(|_| ())
                    .map_err(|e| e.to_string());
                Some(AppMsg::Settings(SettingsMsg::Form(ProductFormMsg::Saved(
                    result,
                ))))
            }
            Cmd::DeleteProduct(id) => {
                let result = svc
                    .delete_product(user_id?, id)
                    .await
                    .map_err(|e| e.to_string());
                Some(AppMsg::Settings(SettingsMsg::ProductDeleted(result)))
            }
            Cmd::SetGoal(value) => {
                let result = svc
                    .set_goal(user_id?, value)
                    .await
                    .map(|_| ())
                    .map_err(|e| e.to_string());
                Some(AppMsg::Settings(SettingsMsg::GoalSaved(result)))
            }
            Cmd::Publish(event) => Some(AppMsg::Domain(event)),
            Cmd::SignOut => Some(AppMsg::SignedOut),
        }
    }
}

impl View for AppShell {
    fn render(&self) -> Rendered {
        let mut html = String::new();
        let mut bindings = Vec::new();

        if let Some(session) = &self.session {
            html.push_str(&format!(
                r#"<nav><button id="nav-dashboard">Dashboard</button><button id="nav-settings">Settings</button><span class="user">{}</span><button id="logout">Log out</button></nav>"#,
                session.email
            ));
            bindings.push(Binding::new("nav-dashboard", EventKind::Click));
            bindings.push(Binding::new("nav-settings", EventKind::Click));
            bindings.push(Binding::new("logout", EventKind::Click));
        }

        let page = match &self.page {
            Page::Login => Rendered {
                html: r#"<div class="login-page"><form id="login-form"><input id="login-email" type="email"><input id="login-password" type="password"><button type="submit">Log in</button></form></div>"#.into(),
                bindings: vec![
                    Binding::new("login-email", EventKind::Input),
                    Binding::new("login-password", EventKind::Input),
                    Binding::new("login-form", EventKind::Submit),
                ],
            },
            Page::Dashboard { tracker, add_meal } => {
                let mut out = tracker.render();
                let modal = add_meal.render();
                out.html.push_str(&modal.html);
                out.bindings.extend(modal.bindings);
                out
            }
            Page::Settings(page) => page.render(),
            Page::NotFound => Rendered {
                html: r#"<div class="not-found"><p>Page not found.</p><a id="go-dashboard">Back to dashboard</a></div>"#.into(),
                bindings: vec![Binding::new("go-dashboard", EventKind::Click)],
            },
        };
        html.push_str(&page.html);
        bindings.extend(page.bindings);

        Rendered { html, bindings }
    }
}
