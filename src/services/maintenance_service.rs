/// ============================================================
///  Maintenance Records & Recurring Schedules
///
///  Two registries behind one service:
///   - records    units of maintenance work with a forward-only
///                 status machine and an append-only timeline
///   - schedules  standing definitions; the sweep turns every due
///                 schedule into a pending record and advances its
///                 next_due_date by the frequency offset
/// ============================================================
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use tracing::info;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::models::maintenance::{
    Frequency, MaintenanceRecord, MaintenanceType, RecurringSchedule, ScheduleUpdate,
    StatusChange, StatusUpdate, SweepReport,
};

#[derive(Clone, Default)]
pub struct MaintenanceService {
    records: Arc<RwLock<Vec<MaintenanceRecord>>>,
    schedules: Arc<RwLock<Vec<RecurringSchedule>>>,
}

impl MaintenanceService {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Records ──────────────────────────────────────────────

    /// Records newest first, optionally for one panel.
    pub fn list_records(
        &self,
        panel_id: Option<Uuid>,
    ) -> Result<Vec<MaintenanceRecord>, ApiError> {
        let records = self.records.read()?;
        let mut out: Vec<MaintenanceRecord> = records
            .iter()
            .filter(|r| panel_id.is_none_or(|id| r.panel_id == id))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    /// Manually requested work. Starts pending, scheduled for `scheduled_date`
    /// (now when the caller left it out).
    pub fn request(
        &self,
        panel_id: Uuid,
        maintenance_type: MaintenanceType,
        scheduled_date: Option<DateTime<Utc>>,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<MaintenanceRecord, ApiError> {
        let record = MaintenanceRecord::new(
            panel_id,
            maintenance_type,
            scheduled_date.unwrap_or(now),
            notes,
            false,
            now,
        );
        self.records.write()?.push(record.clone());
        Ok(record)
    }

    /// Move a record along pending → in_progress → completed, appending a
    /// timeline entry. Any other transition is rejected.
    pub fn update_status(
        &self,
        record_id: Uuid,
        update: StatusUpdate,
        now: DateTime<Utc>,
    ) -> Result<MaintenanceRecord, ApiError> {
        let mut records = self.records.write()?;
        let record = records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or(ApiError::NotFound("maintenance record"))?;

        if !record.status.can_transition_to(update.status) {
            return Err(ApiError::InvalidTransition {
                from: record.status,
                to: update.status,
            });
        }

        record.status = update.status;
        record.updated_at = now;
        record.timeline.push(StatusChange {
            status: update.status,
            at: now,
            note: update.note,
        });
        Ok(record.clone())
    }

    // ─── Schedules ────────────────────────────────────────────

    /// New standing schedule; the first due date is the start date itself.
    pub fn create_schedule(
        &self,
        panel_id: Uuid,
        maintenance_type: MaintenanceType,
        frequency: Frequency,
        start_date: DateTime<Utc>,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<RecurringSchedule, ApiError> {
        let schedule = RecurringSchedule {
            id: Uuid::new_v4(),
            panel_id,
            maintenance_type,
            frequency,
            start_date,
            next_due_date: start_date,
            last_generated_date: None,
            notes,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.schedules.write()?.push(schedule.clone());
        Ok(schedule)
    }

    /// Schedules soonest-due first, optionally for one panel.
    pub fn list_schedules(
        &self,
        panel_id: Option<Uuid>,
    ) -> Result<Vec<RecurringSchedule>, ApiError> {
        let schedules = self.schedules.read()?;
        let mut out: Vec<RecurringSchedule> = schedules
            .iter()
            .filter(|s| panel_id.is_none_or(|id| s.panel_id == id))
            .cloned()
            .collect();
        out.sort_by_key(|s| s.next_due_date);
        Ok(out)
    }

    /// Partial edit. Changing frequency or start date resets next_due_date to
    /// the (possibly new) start date, discarding prior sweep progress.
    pub fn update_schedule(
        &self,
        schedule_id: Uuid,
        update: ScheduleUpdate,
        now: DateTime<Utc>,
    ) -> Result<RecurringSchedule, ApiError> {
        let mut schedules = self.schedules.write()?;
        let schedule = schedules
            .iter_mut()
            .find(|s| s.id == schedule_id)
            .ok_or(ApiError::NotFound("recurring schedule"))?;

        let reset_due = update.frequency.is_some() || update.start_date.is_some();

        if let Some(maintenance_type) = update.maintenance_type {
            schedule.maintenance_type = maintenance_type;
        }
        if let Some(frequency) = update.frequency {
            schedule.frequency = frequency;
        }
        if let Some(start_date) = update.start_date {
            schedule.start_date = start_date;
        }
        if let Some(notes) = update.notes {
            schedule.notes = Some(notes);
        }
        if let Some(is_active) = update.is_active {
            schedule.is_active = is_active;
        }
        if reset_due {
            schedule.next_due_date = schedule.start_date;
        }
        schedule.updated_at = now;
        Ok(schedule.clone())
    }

    pub fn delete_schedule(&self, schedule_id: Uuid) -> Result<(), ApiError> {
        let mut schedules = self.schedules.write()?;
        let before = schedules.len();
        schedules.retain(|s| s.id != schedule_id);
        if schedules.len() == before {
            return Err(ApiError::NotFound("recurring schedule"));
        }
        Ok(())
    }

    /// Flip is_active. The due date is untouched, so re-activating an overdue
    /// schedule makes it fire on the next sweep.
    pub fn toggle_schedule(
        &self,
        schedule_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<RecurringSchedule, ApiError> {
        let mut schedules = self.schedules.write()?;
        let schedule = schedules
            .iter_mut()
            .find(|s| s.id == schedule_id)
            .ok_or(ApiError::NotFound("recurring schedule"))?;
        schedule.is_active = !schedule.is_active;
        schedule.updated_at = now;
        Ok(schedule.clone())
    }

    /// Active schedules due within `[now, now + days]`, soonest first.
    /// The horizon saturates at the calendar maximum.
    pub fn upcoming(
        &self,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<RecurringSchedule>, ApiError> {
        let horizon = now
            .checked_add_signed(Duration::days(i64::from(days)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let schedules = self.schedules.read()?;
        let mut out: Vec<RecurringSchedule> = schedules
            .iter()
            .filter(|s| s.is_active && s.next_due_date >= now && s.next_due_date <= horizon)
            .cloned()
            .collect();
        out.sort_by_key(|s| s.next_due_date);
        Ok(out)
    }

    /// One pending record per due schedule (active, next_due_date ≤ now),
    /// scheduled for the due date it matured on. Advances next_due_date from
    /// its current value, one frequency step per sweep.
    pub fn sweep(&self, now: DateTime<Utc>) -> Result<SweepReport, ApiError> {
        let mut created = Vec::new();
        {
            let mut schedules = self.schedules.write()?;
            for schedule in schedules
                .iter_mut()
                .filter(|s| s.is_active && s.next_due_date <= now)
            {
                let note = format!(
                    "Auto-generated from recurring schedule: {}",
                    schedule.notes.as_deref().unwrap_or("")
                );
                created.push(MaintenanceRecord::new(
                    schedule.panel_id,
                    schedule.maintenance_type,
                    schedule.next_due_date,
                    Some(note),
                    true,
                    now,
                ));
                schedule.next_due_date = schedule.frequency.advance(schedule.next_due_date);
                schedule.last_generated_date = Some(now);
                schedule.updated_at = now;
            }
        }

        if !created.is_empty() {
            self.records.write()?.extend(created.iter().cloned());
            info!(generated = created.len(), "recurring sweep produced records");
        }
        Ok(SweepReport {
            generated: created.len(),
            records: created,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::maintenance::MaintenanceStatus;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
    }

    #[test]
    fn due_monthly_schedule_yields_one_record_and_advances() {
        let service = MaintenanceService::new();
        let panel = Uuid::new_v4();
        let created = at(2024, 1, 10);
        service
            .create_schedule(
                panel,
                MaintenanceType::Cleaning,
                Frequency::Monthly,
                at(2024, 1, 15),
                Some("rooftop array".into()),
                created,
            )
            .unwrap();

        let sweep_time = at(2024, 2, 1);
        let report = service.sweep(sweep_time).unwrap();
        assert_eq!(report.generated, 1);

        let record = &report.records[0];
        assert_eq!(record.panel_id, panel);
        assert_eq!(record.status, MaintenanceStatus::Pending);
        assert!(record.auto_generated);
        assert_eq!(record.scheduled_date, at(2024, 1, 15));
        assert_eq!(
            record.notes.as_deref(),
            Some("Auto-generated from recurring schedule: rooftop array")
        );

        let schedule = &service.list_schedules(Some(panel)).unwrap()[0];
        assert_eq!(schedule.next_due_date, at(2024, 2, 15));
        assert_eq!(schedule.last_generated_date, Some(sweep_time));

        // not due again until the advanced date passes
        assert_eq!(service.sweep(sweep_time).unwrap().generated, 0);
    }

    #[test]
    fn sweep_skips_inactive_and_advances_one_step_per_pass() {
        let service = MaintenanceService::new();
        let panel = Uuid::new_v4();
        let schedule = service
            .create_schedule(
                panel,
                MaintenanceType::Inspection,
                Frequency::Weekly,
                at(2024, 1, 1),
                None,
                at(2024, 1, 1),
            )
            .unwrap();

        service.toggle_schedule(schedule.id, at(2024, 1, 2)).unwrap();
        assert_eq!(service.sweep(at(2024, 2, 1)).unwrap().generated, 0);

        // re-activate: a month overdue, but each sweep advances a single week
        service.toggle_schedule(schedule.id, at(2024, 1, 2)).unwrap();
        assert_eq!(service.sweep(at(2024, 2, 1)).unwrap().generated, 1);
        let after = &service.list_schedules(Some(panel)).unwrap()[0];
        assert_eq!(after.next_due_date, at(2024, 1, 8));
    }

    #[test]
    fn toggle_preserves_the_due_date() {
        let service = MaintenanceService::new();
        let schedule = service
            .create_schedule(
                Uuid::new_v4(),
                MaintenanceType::Cleaning,
                Frequency::Quarterly,
                at(2024, 5, 1),
                None,
                at(2024, 4, 1),
            )
            .unwrap();

        let toggled = service.toggle_schedule(schedule.id, at(2024, 4, 2)).unwrap();
        assert!(!toggled.is_active);
        assert_eq!(toggled.next_due_date, at(2024, 5, 1));
    }

    #[test]
    fn editing_frequency_resets_the_due_date_to_start() {
        let service = MaintenanceService::new();
        let panel = Uuid::new_v4();
        let schedule = service
            .create_schedule(
                panel,
                MaintenanceType::Cleaning,
                Frequency::Monthly,
                at(2024, 1, 15),
                None,
                at(2024, 1, 10),
            )
            .unwrap();
        service.sweep(at(2024, 2, 1)).unwrap();

        let update = ScheduleUpdate {
            maintenance_type: None,
            frequency: Some(Frequency::Weekly),
            start_date: None,
            notes: None,
            is_active: None,
        };
        let updated = service
            .update_schedule(schedule.id, update, at(2024, 2, 2))
            .unwrap();
        assert_eq!(updated.frequency, Frequency::Weekly);
        assert_eq!(updated.next_due_date, at(2024, 1, 15), "reset to start date");
    }

    #[test]
    fn upcoming_returns_only_the_window_sorted() {
        let service = MaintenanceService::new();
        let now = at(2024, 6, 1);
        let panel = Uuid::new_v4();
        for (start, active) in [
            (at(2024, 6, 20), true),
            (at(2024, 6, 5), true),
            (at(2024, 8, 1), true),  // beyond the horizon
            (at(2024, 6, 10), false), // inactive
        ] {
            let s = service
                .create_schedule(
                    panel,
                    MaintenanceType::Cleaning,
                    Frequency::Monthly,
                    start,
                    None,
                    now,
                )
                .unwrap();
            if !active {
                service.toggle_schedule(s.id, now).unwrap();
            }
        }

        let upcoming = service.upcoming(30, now).unwrap();
        assert_eq!(upcoming.len(), 2);
        assert_eq!(upcoming[0].next_due_date, at(2024, 6, 5));
        assert_eq!(upcoming[1].next_due_date, at(2024, 6, 20));
    }

    #[test]
    fn upcoming_horizon_saturates_instead_of_overflowing() {
        let service = MaintenanceService::new();
        let now = at(2024, 6, 1);
        service
            .create_schedule(
                Uuid::new_v4(),
                MaintenanceType::Cleaning,
                Frequency::Monthly,
                at(2024, 6, 5),
                None,
                now,
            )
            .unwrap();

        let upcoming = service.upcoming(u32::MAX, now).unwrap();
        assert_eq!(upcoming.len(), 1);
    }

    #[test]
    fn status_walks_forward_and_rejects_jumps() {
        let service = MaintenanceService::new();
        let now = at(2024, 3, 1);
        let record = service
            .request(Uuid::new_v4(), MaintenanceType::Repair, None, None, now)
            .unwrap();
        assert!(!record.auto_generated);

        let err = service
            .update_status(
                record.id,
                StatusUpdate {
                    status: MaintenanceStatus::Completed,
                    note: None,
                },
                now,
            )
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidTransition { .. }));

        let in_progress = service
            .update_status(
                record.id,
                StatusUpdate {
                    status: MaintenanceStatus::InProgress,
                    note: Some("crew dispatched".into()),
                },
                at(2024, 3, 2),
            )
            .unwrap();
        assert_eq!(in_progress.status, MaintenanceStatus::InProgress);
        assert_eq!(in_progress.timeline.len(), 2);
        assert_eq!(in_progress.timeline[1].note.as_deref(), Some("crew dispatched"));

        let done = service
            .update_status(
                record.id,
                StatusUpdate {
                    status: MaintenanceStatus::Completed,
                    note: None,
                },
                at(2024, 3, 3),
            )
            .unwrap();
        assert_eq!(done.status, MaintenanceStatus::Completed);
        assert_eq!(done.timeline.len(), 3);
    }

    #[test]
    fn unknown_ids_surface_not_found() {
        let service = MaintenanceService::new();
        let missing = Uuid::new_v4();
        assert!(matches!(
            service.update_status(
                missing,
                StatusUpdate {
                    status: MaintenanceStatus::InProgress,
                    note: None
                },
                at(2024, 1, 1),
            ),
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            service.delete_schedule(missing),
            Err(ApiError::NotFound(_))
        ));
    }
}
