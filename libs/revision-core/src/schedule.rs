//! Daily schedule construction.
//!
//! Turns one learner's item set into prioritized, time-boxed sessions.
//! Read-only over the items: building a schedule never mutates state.

use chrono::{DateTime, Datelike, Duration, Utc, Weekday};
use uuid::Uuid;

use crate::retention::RetentionModel;
use crate::types::{RevisionItem, ScheduleSession, SessionType, StudyPreferences};

/// How close the exam is, by explicit day thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamProximity {
    /// No exam pressure.
    Open,
    /// Exam within 30 days.
    Intensive,
    /// Exam within 7 days.
    Sprint,
}

/// Builds the session plan for one learner-day.
#[derive(Debug, Clone)]
pub struct ScheduleBuilder {
    pub retention: RetentionModel,
    /// Days before the exam at which sprint mode starts.
    pub sprint_days: i64,
    /// Days before the exam at which intensive mode starts.
    pub intensive_days: i64,
    /// Minute-budget multipliers for the proximity modes.
    pub sprint_factor: f64,
    pub intensive_factor: f64,
    /// Share of the weekday budget given to the morning session.
    pub morning_share: f64,
    /// Minute budget of one catch-up session.
    pub catch_up_minutes: u32,
}

impl Default for ScheduleBuilder {
    fn default() -> Self {
        Self {
            retention: RetentionModel::default(),
            sprint_days: 7,
            intensive_days: 30,
            sprint_factor: 1.5,
            intensive_factor: 1.25,
            morning_share: 0.6,
            catch_up_minutes: 20,
        }
    }
}

impl ScheduleBuilder {
    /// Build the time-boxed sessions for `date`. Items due by the end of
    /// the day are taken first; a short look-ahead pulls upcoming items in
    /// for batching. Sessions never overlap.
    pub fn build_daily_schedule(
        &self,
        items: &[RevisionItem],
        date: DateTime<Utc>,
        preferences: &StudyPreferences,
    ) -> Vec<ScheduleSession> {
        let day_start = start_of_day(date);
        let day_end = day_start + Duration::days(1);

        let proximity = preferences
            .exam_date
            .map(|exam| self.proximity(day_start, exam))
            .unwrap_or(ExamProximity::Open);
        let look_ahead_days = match proximity {
            ExamProximity::Sprint => 0,
            ExamProximity::Intensive => preferences.look_ahead_days.min(1),
            ExamProximity::Open => preferences.look_ahead_days,
        };
        let minute_factor = match proximity {
            ExamProximity::Sprint => self.sprint_factor,
            ExamProximity::Intensive => self.intensive_factor,
            ExamProximity::Open => 1.0,
        };

        let horizon = day_end + Duration::days(look_ahead_days as i64);
        let mut pool: Vec<&RevisionItem> =
            items.iter().filter(|i| i.next_due_at < horizon).collect();
        sort_by_urgency(&mut pool, day_start);

        let budget_minutes = (preferences.daily_minutes as f64 * minute_factor).round() as u32;
        let slots = self.day_slots(day_start, budget_minutes);

        let mut sessions = Vec::new();
        let mut cursor = 0;
        for (session_type, minutes) in slots {
            if cursor >= pool.len() {
                break;
            }
            let per_item = preferences
                .minutes_per_item
                .unwrap_or_else(|| session_type.minutes_per_item());
            let capacity = (minutes as f64 / per_item).floor() as usize;
            if capacity == 0 {
                continue;
            }
            let batch = &pool[cursor..(cursor + capacity).min(pool.len())];
            cursor += batch.len();
            sessions.push(self.make_session(batch, session_type, day_start, per_item));
        }
        sessions
    }

    /// Re-prioritize missed items into catch-up sessions that do not
    /// overlap any existing session window.
    pub fn recover_missed(
        &self,
        missed: &[RevisionItem],
        existing: &[ScheduleSession],
        date: DateTime<Utc>,
    ) -> Vec<ScheduleSession> {
        if missed.is_empty() {
            return Vec::new();
        }
        let day_start = start_of_day(date);
        let mut ordered: Vec<&RevisionItem> = missed.iter().collect();
        ordered.sort_by(|a, b| {
            b.importance_tier
                .rank()
                .cmp(&a.importance_tier.rank())
                .then(b.struggling_count.cmp(&a.struggling_count))
        });

        let per_item = SessionType::CatchUp.minutes_per_item();
        let capacity = ((self.catch_up_minutes as f64 / per_item).floor() as usize).max(1);

        let mut taken: Vec<ScheduleSession> = existing.to_vec();
        let mut recovered = Vec::new();
        for batch in ordered.chunks(capacity) {
            let mut session =
                self.make_session(batch, SessionType::CatchUp, day_start, per_item);
            // Slide the window forward until it sits clear of every other
            // session on the day.
            while let Some(blocker) = taken.iter().find(|s| s.overlaps(&session)) {
                let shift = blocker.window_end - session.window_start;
                session.window_start += shift;
                session.window_end += shift;
            }
            taken.push(session.clone());
            recovered.push(session);
        }
        recovered
    }

    /// Exam proximity for the planned day.
    pub fn proximity(&self, date: DateTime<Utc>, exam_date: DateTime<Utc>) -> ExamProximity {
        let days_until = (exam_date - date).num_days();
        if days_until <= self.sprint_days {
            ExamProximity::Sprint
        } else if days_until <= self.intensive_days {
            ExamProximity::Intensive
        } else {
            ExamProximity::Open
        }
    }

    /// Urgency score of one item as of the planned day. Feeds session
    /// priority; the ordering itself uses the lexicographic composite key.
    pub fn priority_score(&self, item: &RevisionItem, as_of: DateTime<Utc>) -> f64 {
        let overdue = item.overdue_days(as_of).max(0) as f64;
        let predicted = self
            .retention
            .predict_retention(item, item.hours_since_review(as_of));
        overdue * 2.0
            + item.importance_tier.rank() as f64 * 10.0
            + item.struggling_count as f64 * 5.0
            + (100.0 - predicted) / 10.0
    }

    /// Session slots for the day: one comprehensive block on weekends, a
    /// morning/evening split on weekdays.
    fn day_slots(&self, day_start: DateTime<Utc>, budget_minutes: u32) -> Vec<(SessionType, u32)> {
        let weekend = matches!(day_start.weekday(), Weekday::Sat | Weekday::Sun);
        if weekend {
            vec![(SessionType::WeekendComprehensive, budget_minutes)]
        } else {
            let morning = (budget_minutes as f64 * self.morning_share).round() as u32;
            vec![
                (SessionType::MorningIntensive, morning),
                (SessionType::EveningRecall, budget_minutes.saturating_sub(morning)),
            ]
        }
    }

    fn make_session(
        &self,
        batch: &[&RevisionItem],
        session_type: SessionType,
        day_start: DateTime<Utc>,
        per_item_minutes: f64,
    ) -> ScheduleSession {
        let duration_minutes = (batch.len() as f64 * per_item_minutes).ceil() as u32;
        let window_start = day_start + Duration::hours(session_type.start_hour() as i64);
        let priority = if batch.is_empty() {
            0.0
        } else {
            batch
                .iter()
                .map(|i| self.priority_score(i, day_start))
                .sum::<f64>()
                / batch.len() as f64
        };
        ScheduleSession {
            session_id: Uuid::new_v4(),
            window_start,
            window_end: window_start + Duration::minutes(duration_minutes as i64),
            session_type,
            ordered_item_ids: interleave_subjects(batch),
            estimated_duration_minutes: duration_minutes,
            priority_score: priority,
        }
    }
}

/// Composite urgency ordering: overdue days desc, importance desc,
/// struggling count desc, last reviewed asc (never-reviewed first).
fn sort_by_urgency(pool: &mut [&RevisionItem], as_of: DateTime<Utc>) {
    pool.sort_by(|a, b| {
        b.overdue_days(as_of)
            .cmp(&a.overdue_days(as_of))
            .then(b.importance_tier.rank().cmp(&a.importance_tier.rank()))
            .then(b.struggling_count.cmp(&a.struggling_count))
            .then(
                a.last_reviewed_at
                    .unwrap_or(DateTime::<Utc>::MIN_UTC)
                    .cmp(&b.last_reviewed_at.unwrap_or(DateTime::<Utc>::MIN_UTC)),
            )
    });
}

/// Round-robin across subjects, preserving urgency order within each
/// subject, so a batch never massed-practices a single topic.
fn interleave_subjects(batch: &[&RevisionItem]) -> Vec<Uuid> {
    let mut groups: Vec<(&str, Vec<Uuid>)> = Vec::new();
    for item in batch {
        match groups.iter_mut().find(|(subject, _)| *subject == item.subject) {
            Some((_, ids)) => ids.push(item.item_id),
            None => groups.push((item.subject.as_str(), vec![item.item_id])),
        }
    }
    let mut ordered = Vec::with_capacity(batch.len());
    let mut round = 0;
    loop {
        let mut emitted = false;
        for (_, ids) in &groups {
            if let Some(id) = ids.get(round) {
                ordered.push(*id);
                emitted = true;
            }
        }
        if !emitted {
            break;
        }
        round += 1;
    }
    ordered
}

fn start_of_day(date: DateTime<Utc>) -> DateTime<Utc> {
    date.date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time")
        .and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContentType, DifficultyTier, ImportanceTier};
    use chrono::TimeZone;

    // 2026-03-02 is a Monday.
    fn monday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 6, 0, 0).unwrap()
    }

    fn saturday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 7, 6, 0, 0).unwrap()
    }

    fn item(subject: &str, due_days_ago: i64) -> RevisionItem {
        let mut it = RevisionItem::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            ContentType::Concept,
            subject,
            "unit-1",
            format!("{subject} item"),
            monday() - Duration::days(due_days_ago),
        );
        it.next_due_at = monday() - Duration::days(due_days_ago);
        it
    }

    fn many_items(n: usize) -> Vec<RevisionItem> {
        (0..n).map(|_| item("maths", 1)).collect()
    }

    #[test]
    fn capacity_limits_selection() {
        let builder = ScheduleBuilder::default();
        let items = many_items(20);
        let preferences = StudyPreferences {
            daily_minutes: 30,
            minutes_per_item: Some(2.0),
            ..Default::default()
        };
        let sessions = builder.build_daily_schedule(&items, monday(), &preferences);
        let placed: usize = sessions.iter().map(|s| s.ordered_item_ids.len()).sum();
        assert!(placed <= 15, "placed {placed} items into 30 minutes");
        assert!(!sessions.is_empty());
    }

    #[test]
    fn ordering_is_overdue_then_importance() {
        let builder = ScheduleBuilder::default();
        let mut fresher = item("maths", 1);
        fresher.importance_tier = ImportanceTier::Critical;
        let mut older_low = item("maths", 5);
        older_low.importance_tier = ImportanceTier::Low;
        let mut same_day_high = item("maths", 1);
        same_day_high.importance_tier = ImportanceTier::High;

        let items = vec![fresher.clone(), older_low.clone(), same_day_high.clone()];
        let sessions = builder.build_daily_schedule(&items, monday(), &StudyPreferences::default());
        let first = &sessions[0].ordered_item_ids;
        // Most overdue first regardless of importance, then importance
        // breaks the tie between the two same-day items.
        assert_eq!(first[0], older_low.item_id);
        assert_eq!(first[1], fresher.item_id);
        assert_eq!(first[2], same_day_high.item_id);
    }

    #[test]
    fn weekday_splits_morning_and_evening() {
        let builder = ScheduleBuilder::default();
        let items = many_items(30);
        let sessions =
            builder.build_daily_schedule(&items, monday(), &StudyPreferences::default());
        let types: Vec<_> = sessions.iter().map(|s| s.session_type).collect();
        assert_eq!(
            types,
            vec![SessionType::MorningIntensive, SessionType::EveningRecall]
        );
    }

    #[test]
    fn weekend_uses_single_comprehensive_session() {
        let builder = ScheduleBuilder::default();
        let items = many_items(10);
        let sessions =
            builder.build_daily_schedule(&items, saturday(), &StudyPreferences::default());
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].session_type, SessionType::WeekendComprehensive);
    }

    #[test]
    fn sessions_never_overlap() {
        let builder = ScheduleBuilder::default();
        let items = many_items(40);
        let sessions =
            builder.build_daily_schedule(&items, monday(), &StudyPreferences::default());
        for (i, a) in sessions.iter().enumerate() {
            for b in &sessions[i + 1..] {
                assert!(!a.overlaps(b));
            }
        }
    }

    #[test]
    fn sprint_mode_raises_budget_and_drops_look_ahead() {
        let builder = ScheduleBuilder::default();
        let mut items = many_items(40);
        // One upcoming item, due in two days: visible in open mode via
        // look-ahead, invisible in sprint mode.
        let mut upcoming = item("physics", 0);
        upcoming.next_due_at = monday() + Duration::days(2);
        items.push(upcoming.clone());

        let open_preferences = StudyPreferences::default();
        let sprint_preferences = StudyPreferences {
            exam_date: Some(monday() + Duration::days(3)),
            ..Default::default()
        };

        let open = builder.build_daily_schedule(&items, monday(), &open_preferences);
        let sprint = builder.build_daily_schedule(&items, monday(), &sprint_preferences);

        let open_minutes: u32 = open.iter().map(|s| s.estimated_duration_minutes).sum();
        let sprint_minutes: u32 = sprint.iter().map(|s| s.estimated_duration_minutes).sum();
        assert!(sprint_minutes > open_minutes);

        let sprint_ids: Vec<_> = sprint
            .iter()
            .flat_map(|s| s.ordered_item_ids.iter().copied())
            .collect();
        assert!(!sprint_ids.contains(&upcoming.item_id));
    }

    #[test]
    fn subjects_are_interleaved_within_a_batch() {
        let builder = ScheduleBuilder::default();
        let items = vec![
            item("maths", 1),
            item("maths", 1),
            item("physics", 1),
            item("physics", 1),
        ];
        let sessions =
            builder.build_daily_schedule(&items, monday(), &StudyPreferences::default());
        let ordered = &sessions[0].ordered_item_ids;
        assert_eq!(ordered.len(), 4);

        let subject_of = |id: &Uuid| {
            items
                .iter()
                .find(|i| i.item_id == *id)
                .map(|i| i.subject.clone())
                .unwrap()
        };
        // Alternating subjects, never two of the same back to back until a
        // group runs dry.
        assert_ne!(subject_of(&ordered[0]), subject_of(&ordered[1]));
        assert_ne!(subject_of(&ordered[2]), subject_of(&ordered[3]));
    }

    #[test]
    fn catch_up_sessions_avoid_existing_windows() {
        let builder = ScheduleBuilder::default();
        let items = many_items(30);
        let sessions =
            builder.build_daily_schedule(&items, monday(), &StudyPreferences::default());

        let missed: Vec<RevisionItem> = (0..20).map(|_| item("history", 3)).collect();
        let recovered = builder.recover_missed(&missed, &sessions, monday());
        assert!(!recovered.is_empty());
        assert!(recovered.iter().all(|s| s.session_type == SessionType::CatchUp));

        let mut all = sessions.clone();
        all.extend(recovered.clone());
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert!(!a.overlaps(b), "{:?} overlaps {:?}", a.session_type, b.session_type);
            }
        }
        // Every missed item is placed.
        let placed: usize = recovered.iter().map(|s| s.ordered_item_ids.len()).sum();
        assert_eq!(placed, missed.len());
    }

    #[test]
    fn missed_items_are_ordered_by_importance_then_struggle() {
        let builder = ScheduleBuilder::default();
        let mut low = item("history", 3);
        low.importance_tier = ImportanceTier::Low;
        let mut critical = item("history", 3);
        critical.importance_tier = ImportanceTier::Critical;
        let mut high_struggling = item("history", 3);
        high_struggling.importance_tier = ImportanceTier::High;
        high_struggling.struggling_count = 4;
        let mut high_calm = item("history", 3);
        high_calm.importance_tier = ImportanceTier::High;

        let missed = vec![low.clone(), high_calm.clone(), critical.clone(), high_struggling.clone()];
        let recovered = builder.recover_missed(&missed, &[], monday());
        let ordered = &recovered[0].ordered_item_ids;
        assert_eq!(ordered[0], critical.item_id);
        assert_eq!(ordered[1], high_struggling.item_id);
        assert_eq!(ordered[2], high_calm.item_id);
        assert_eq!(ordered[3], low.item_id);
    }

    #[test]
    fn empty_item_set_builds_no_sessions() {
        let builder = ScheduleBuilder::default();
        let sessions =
            builder.build_daily_schedule(&[], monday(), &StudyPreferences::default());
        assert!(sessions.is_empty());
        assert!(builder.recover_missed(&[], &[], monday()).is_empty());
    }

    #[test]
    fn priority_grows_with_overdue_and_struggle() {
        let builder = ScheduleBuilder::default();
        let calm = item("maths", 0);
        let mut urgent = item("maths", 6);
        urgent.struggling_count = 3;
        urgent.importance_tier = ImportanceTier::Critical;
        assert!(
            builder.priority_score(&urgent, monday()) > builder.priority_score(&calm, monday())
        );
    }

    #[test]
    fn hard_items_do_not_change_composite_order() {
        // Difficulty affects time estimates elsewhere, not the ordering key.
        let builder = ScheduleBuilder::default();
        let mut hard = item("maths", 2);
        hard.difficulty_tier = DifficultyTier::Hard;
        let easy = item("maths", 3);
        let items = vec![hard.clone(), easy.clone()];
        let sessions =
            builder.build_daily_schedule(&items, monday(), &StudyPreferences::default());
        assert_eq!(sessions[0].ordered_item_ids[0], easy.item_id);
    }
}
