use time::Date;
use uuid::Uuid;

use crate::{entries::repo::Entry, helpers, view::events::DomainEvent};

use super::{Binding, Cmd, EventKind, Rendered, Session, View};

/// How today's intake compares to the goal. Within 110 kcal over still counts
/// as near, anything beyond that is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressTone {
    Within,
    Near,
    Over,
}

/// Day view: the entries logged against the selected date plus the goal in
/// effect that day.
#[derive(Debug)]
pub struct CalorieTracker {
    session: Session,
    pub selected_date: Date,
    entries: Vec<Entry>,
    goal: Option<i32>,
    loading: bool,
    fetch_token: u64,
    notice: Option<String>,
}

#[derive(Debug, Clone)]
pub enum TrackerMsg {
    PrevDay,
    NextDay,
    Today,
    Reload,
    DayLoaded {
        token: u64,
        entries: Vec<Entry>,
        goal: Option<i32>,
    },
    DeleteEntry(Uuid),
    Deleted(Result<(), String>),
}

impl CalorieTracker {
    /// Mount: render once with `loading = true`, then fetch.
    pub fn mount(session: Session) -> (Self, Vec<Cmd>) {
        let mut tracker = Self {
            session,
            selected_date: helpers::today_utc(),
            entries: Vec::new(),
            goal: None,
            loading: true,
            fetch_token: 0,
            notice: None,
        };
        let cmds = tracker.begin_load();
        (tracker, cmds)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn goal(&self) -> Option<i32> {
        self.goal
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    fn begin_load(&mut self) -> Vec<Cmd> {
        self.loading = true;
        self.fetch_token += 1;
        vec![Cmd::LoadDay {
            token: self.fetch_token,
            date: self.selected_date,
        }]
    }

    pub fn total_calories(&self) -> i64 {
        self.entries.iter().map(|e| i64::from(e.calories)).sum()
    }

    pub fn remaining_calories(&self) -> Option<i64> {
        self.goal.map(|goal| i64::from(goal) - self.total_calories())
    }

    /// Percentage of the goal consumed, capped at 100. Zero without a goal.
    pub fn progress_percent(&self) -> u32 {
        let Some(goal) = self.goal.filter(|g| *g > 0) else {
            return 0;
        };
        let pct = (self.total_calories() as f64 / f64::from(goal) * 100.0).round() as i64;
        pct.clamp(0, 100) as u32
    }

    pub fn progress_tone(&self) -> Option<ProgressTone> {
        let remaining = self.remaining_calories()?;
        Some(if remaining >= 0 {
            ProgressTone::Within
        } else if remaining.abs() <= 110 {
            ProgressTone::Near
        } else {
            ProgressTone::Over
        })
    }

    pub fn update(&mut self, msg: TrackerMsg) -> Vec<Cmd> {
        match msg {
            TrackerMsg::PrevDay => {
                self.selected_date = helpers::add_days(self.selected_date, -1);
                self.begin_load()
            }
            TrackerMsg::NextDay => {
                self.selected_date = helpers::add_days(self.selected_date, 1);
                self.begin_load()
            }
            TrackerMsg::Today => {
                self.selected_date = helpers::today_utc();
                self.begin_load()
            }
            TrackerMsg::Reload => self.begin_load(),
            TrackerMsg::DayLoaded {
                token,
                entries,
                goal,
            } => {
                if token != self.fetch_token {
                    // Superseded by a newer navigation; drop it.
                    return Vec::new();
                }
                self.entries = entries;
                self.goal = goal;
                self.loading = false;
                // Fresh data supersedes any earlier failure banner.
                self.notice = None;
                Vec::new()
            }
            TrackerMsg::DeleteEntry(id) => vec![Cmd::DeleteEntry(id)],
            TrackerMsg::Deleted(Ok(())) => vec![Cmd::Publish(DomainEvent::EntriesUpdated)],
            TrackerMsg::Deleted(Err(msg)) => {
                self.notice = Some(msg);
                Vec::new()
            }
        }
    }
}

impl View for CalorieTracker {
    fn render(&self) -> Rendered {
        let mut bindings = vec![
            Binding::new("date-prev", EventKind::Click),
            Binding::new("date-today", EventKind::Click),
            Binding::new("date-next", EventKind::Click),
        ];
        let mut html = format!(
            r#"<div class="date-selector"><button id="date-prev">&lt;</button><button id="date-today">{}</button><button id="date-next">&gt;</button></div>"#,
            helpers::format_display_date(self.selected_date)
        );
        if let Some(notice) = &self.notice {
            html.push_str(&format!(r#"<div class="notice error">{notice}</div>"#));
        }

        if self.loading {
            html.push_str(r#"<div class="loading">Loading...</div>"#);
            return Rendered { html, bindings };
        }

        let total = self.total_calories();
        html.push_str(&format!(
            r#"<div class="progress-card"><span>{}%</span><div class="consumed">{} kcal</div>"#,
            self.progress_percent(),
            helpers::format_number(total)
        ));
        if let Some(remaining) = self.remaining_calories() {
            let tone = match self.progress_tone() {
                Some(ProgressTone::Within) => "within",
                Some(ProgressTone::Near) => "near",
                Some(ProgressTone::Over) => "over",
                None => "none",
            };
            html.push_str(&format!(
                r#"<div class="remaining {tone}">{} kcal</div>"#,
                helpers::format_number(remaining)
            ));
        } else {
            html.push_str(r#"<div class="no-goal">No goal set</div>"#);
        }
        html.push_str("</div>");

        if self.entries.is_empty() {
            html.push_str(r#"<div class="empty-state">Nothing logged for this day.</div>"#);
        } else {
            html.push_str(r#"<div class="entries-card">"#);
            for entry in &self.entries {
                let delete_id = format!("delete-entry-{}", entry.id);
                html.push_str(&format!(
                    r#"<div class="entry-item"><span class="entry-name">{}</span><span class="entry-grams">{} g</span><span class="entry-calories">{} kcal</span><button id="{delete_id}">x</button></div>"#,
                    helpers::truncate(&entry.product_name, 40),
                    entry.grams,
                    entry.calories
                ));
                bindings.push(Binding::new(delete_id, EventKind::Click));
            }
            html.push_str("</div>");
        }

        Rendered { html, bindings }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn session() -> Session {
        Session {
            user_id: Uuid::new_v4(),
            email: "test@example.com".into(),
        }
    }

    fn entry(calories: i32) -> Entry {
        Entry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            product_name: "Oatmeal".into(),
            grams: 100,
            calories,
            date: helpers::today_utc(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn loaded(tracker: &mut CalorieTracker, entries: Vec<Entry>, goal: Option<i32>) {
        let token = tracker.fetch_token;
        tracker.update(TrackerMsg::DayLoaded {
            token,
            entries,
            goal,
        });
    }

    #[test]
    fn mounts_loading_and_fetches_the_current_day() {
        let (tracker, cmds) = CalorieTracker::mount(session());
        assert!(tracker.is_loading());
        assert!(tracker.render().html.contains("Loading"));
        assert!(
            matches!(cmds[..], [Cmd::LoadDay { date, .. }] if date == tracker.selected_date)
        );
    }

    #[test]
    fn loading_clears_on_arrival_even_with_no_data() {
        let (mut tracker, _) = CalorieTracker::mount(session());
        loaded(&mut tracker, Vec::new(), None);
        assert!(!tracker.is_loading());
        assert!(tracker.render().html.contains("Nothing logged"));
        assert!(tracker.render().html.contains("No goal set"));
    }

    #[test]
    fn date_navigation_refetches() {
        let (mut tracker, _) = CalorieTracker::mount(session());
        let start = tracker.selected_date;

        let cmds = tracker.update(TrackerMsg::PrevDay);
        assert_eq!(tracker.selected_date, helpers::add_days(start, -1));
        assert!(matches!(cmds[..], [Cmd::LoadDay { .. }]));
        assert!(tracker.is_loading());

        tracker.update(TrackerMsg::NextDay);
        tracker.update(TrackerMsg::Today);
        assert_eq!(tracker.selected_date, helpers::today_utc());
    }

    #[test]
    fn stale_day_loads_are_discarded() {
        let (mut tracker, cmds) = CalorieTracker::mount(session());
        let Cmd::LoadDay { token: stale, .. } = cmds[0] else {
            panic!()
        };
        // Navigate away before the first fetch lands.
        tracker.update(TrackerMsg::PrevDay);

        tracker.update(TrackerMsg::DayLoaded {
            token: stale,
            entries: vec![entry(999)],
            goal: Some(1000),
        });
        assert!(tracker.is_loading());
        assert!(tracker.entries().is_empty());
    }

    #[test]
    fn totals_and_progress_derive_from_entries() {
        let (mut tracker, _) = CalorieTracker::mount(session());
        loaded(&mut tracker, vec![entry(420), entry(300)], Some(2000));

        assert_eq!(tracker.total_calories(), 720);
        assert_eq!(tracker.remaining_calories(), Some(1280));
        assert_eq!(tracker.progress_percent(), 36);
        assert_eq!(tracker.progress_tone(), Some(ProgressTone::Within));
    }

    #[test]
    fn progress_percent_caps_at_100() {
        let (mut tracker, _) = CalorieTracker::mount(session());
        loaded(&mut tracker, vec![entry(3000)], Some(2000));
        assert_eq!(tracker.progress_percent(), 100);
    }

    #[test]
    fn tone_thresholds() {
        let (mut tracker, _) = CalorieTracker::mount(session());
        loaded(&mut tracker, vec![entry(2110)], Some(2000));
        assert_eq!(tracker.progress_tone(), Some(ProgressTone::Near));

        loaded(&mut tracker, vec![entry(2111)], Some(2000));
        assert_eq!(tracker.progress_tone(), Some(ProgressTone::Over));

        loaded(&mut tracker, vec![entry(2000)], Some(2000));
        assert_eq!(tracker.progress_tone(), Some(ProgressTone::Within));

        loaded(&mut tracker, vec![entry(100)], None);
        assert_eq!(tracker.progress_tone(), None);
    }

    #[test]
    fn delete_flows_through_service_then_republishes() {
        let (mut tracker, _) = CalorieTracker::mount(session());
        let e = entry(420);
        loaded(&mut tracker, vec![e.clone()], Some(2000));

        let cmds = tracker.update(TrackerMsg::DeleteEntry(e.id));
        assert!(matches!(cmds[..], [Cmd::DeleteEntry(id)] if id == e.id));

        let cmds = tracker.update(TrackerMsg::Deleted(Ok(())));
        assert!(matches!(
            cmds[..],
            [Cmd::Publish(DomainEvent::EntriesUpdated)]
        ));
    }

    #[test]
    fn successful_reload_clears_an_earlier_failure_banner() {
        let (mut tracker, _) = CalorieTracker::mount(session());
        loaded(&mut tracker, vec![entry(420)], Some(2000));

        tracker.update(TrackerMsg::Deleted(Err("delete failed".into())));
        assert!(tracker.render().html.contains("delete failed"));

        tracker.update(TrackerMsg::Reload);
        loaded(&mut tracker, vec![entry(420)], Some(2000));
        assert!(!tracker.render().html.contains("delete failed"));
    }

    #[test]
    fn render_is_idempotent_with_per_entry_bindings() {
        let (mut tracker, _) = CalorieTracker::mount(session());
        loaded(&mut tracker, vec![entry(420), entry(300)], Some(2000));

        let first = tracker.render();
        assert_eq!(first, tracker.render());
        // Date nav (3) plus one delete per entry.
        assert_eq!(first.bindings.len(), 5);
    }
}
