//! Availability calculator
//!
//! Generates bookable slot start instants for a staff/service pair. Shift
//! boundaries live in the salon's local civil time and are resolved to
//! absolute instants per calendar date through the IANA timezone, so
//! daylight-saving offset changes are handled correctly. Bookings are
//! compared in absolute time with half-open [start, end) semantics.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use crate::{
    config::BookingConfig,
    error::{AppError, AppResult},
    models::shift::Shift,
    repository::Repository,
};

/// Resolve a local wall-clock time on a date to an absolute instant.
///
/// Ambiguous local times (DST fall-back) take the earlier offset; local
/// times skipped by spring-forward do not exist and yield None.
pub fn resolve_local(tz: Tz, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&date.and_time(time)) {
        chrono::LocalResult::Single(t) => Some(t.with_timezone(&Utc)),
        chrono::LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        chrono::LocalResult::None => None,
    }
}

/// Round a local time up to the next multiple of the grid step from
/// local midnight.
fn align_to_grid(time: NaiveTime, step_minutes: u32) -> Option<NaiveTime> {
    let minutes = time.hour() * 60 + time.minute();
    let rem = minutes % step_minutes;
    let aligned = if rem == 0 && time.second() == 0 {
        minutes
    } else {
        minutes - rem + step_minutes
    };
    NaiveTime::from_hms_opt(aligned / 60, aligned % 60, 0)
}

/// Candidate start instants within one shift window on one calendar date.
fn slots_in_window(
    tz: Tz,
    date: NaiveDate,
    shift: &Shift,
    busy: &[(DateTime<Utc>, DateTime<Utc>)],
    duration: Duration,
    step: Duration,
    step_minutes: u32,
) -> Vec<DateTime<Utc>> {
    let Some(first_local) = align_to_grid(shift.start_time, step_minutes) else {
        return Vec::new();
    };
    // A window whose boundary falls in a spring-forward gap is dropped for
    // that date rather than silently truncated.
    let (Some(window_start), Some(window_end)) = (
        resolve_local(tz, date, first_local),
        resolve_local(tz, date, shift.end_time),
    ) else {
        return Vec::new();
    };

    let mut slots = Vec::new();
    let mut start = window_start;
    // A candidate whose end crosses the shift end boundary is excluded.
    while start + duration <= window_end {
        let end = start + duration;
        let overlaps = busy.iter().any(|&(b_start, b_end)| start < b_end && end > b_start);
        if !overlaps {
            slots.push(start);
        }
        start += step;
    }
    slots
}

/// Lazy sequence of bookable start instants over a date range.
pub fn compute_slots<'a>(
    shifts: &'a [Shift],
    busy: &'a [(DateTime<Utc>, DateTime<Utc>)],
    from: NaiveDate,
    to: NaiveDate,
    tz: Tz,
    duration: Duration,
    step_minutes: u32,
) -> impl Iterator<Item = DateTime<Utc>> + 'a {
    let step = Duration::minutes(step_minutes as i64);
    from.iter_days()
        .take_while(move |d| *d <= to)
        .flat_map(move |date| {
            let weekday = date.weekday().num_days_from_monday() as i16;
            shifts
                .iter()
                .filter(move |s| s.is_active && s.day_of_week == weekday)
                .flat_map(move |shift| {
                    slots_in_window(tz, date, shift, busy, duration, step, step_minutes)
                })
        })
}

/// Whether [start, end) is fully contained in some active shift for the
/// staff member on the booking's local day. Union semantics: any single
/// containing window qualifies.
pub fn window_within_shifts(
    shifts: &[Shift],
    tz: Tz,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
) -> bool {
    let local_date = start_at.with_timezone(&tz).date_naive();
    let weekday = local_date.weekday().num_days_from_monday() as i16;
    shifts
        .iter()
        .filter(|s| s.is_active && s.day_of_week == weekday)
        .any(|shift| {
            match (
                resolve_local(tz, local_date, shift.start_time),
                resolve_local(tz, local_date, shift.end_time),
            ) {
                (Some(shift_start), Some(shift_end)) => {
                    start_at >= shift_start && end_at <= shift_end
                }
                _ => false,
            }
        })
}

/// Parse a tenant's stored IANA timezone name
pub fn parse_timezone(name: &str) -> AppResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| AppError::Internal(format!("Invalid tenant timezone '{}'", name)))
}

#[derive(Clone)]
pub struct AvailabilityService {
    repository: Repository,
    config: BookingConfig,
}

impl AvailabilityService {
    pub fn new(repository: Repository, config: BookingConfig) -> Self {
        Self { repository, config }
    }

    /// Bookable slot start instants for a service/staff pair over a date
    /// range. Pure read: no side effects.
    pub async fn get_slots(
        &self,
        salon: &crate::models::salon::Salon,
        service_id: Uuid,
        staff_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<DateTime<Utc>>> {
        if to < from {
            return Err(AppError::Validation("Date range is inverted".to_string()));
        }
        if (to - from).num_days() > self.config.max_range_days {
            return Err(AppError::Validation(format!(
                "Date range exceeds {} days",
                self.config.max_range_days
            )));
        }

        let tz = parse_timezone(&salon.timezone)?;
        let service = self.repository.salons.get_service(salon.id, service_id).await?;
        let staff = self.repository.salons.get_staff(salon.id, staff_id).await?;
        let shifts = self.repository.shifts.list_active(salon.id, staff.id).await?;

        // Bound the busy-interval read to the date range, padded a day on
        // each side to absorb the timezone offset.
        let range_start =
            Utc.from_utc_datetime(&from.and_time(NaiveTime::MIN)) - Duration::days(1);
        let range_end = Utc.from_utc_datetime(&to.and_time(NaiveTime::MIN)) + Duration::days(2);
        let busy = self
            .repository
            .bookings
            .busy_intervals(staff.id, range_start, range_end)
            .await?;

        let duration = Duration::minutes(service.duration_minutes as i64);
        let slots = compute_slots(
            &shifts,
            &busy,
            from,
            to,
            tz,
            duration,
            self.config.slot_step_minutes,
        )
        .collect();
        Ok(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shift(day_of_week: i16, start: &str, end: &str) -> Shift {
        Shift {
            id: Uuid::new_v4(),
            salon_id: Uuid::new_v4(),
            staff_id: Uuid::new_v4(),
            day_of_week,
            start_time: NaiveTime::parse_from_str(start, "%H:%M").unwrap(),
            end_time: NaiveTime::parse_from_str(end, "%H:%M").unwrap(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn paris() -> Tz {
        "Europe/Paris".parse().unwrap()
    }

    fn local(tz: Tz, date: &str, time: &str) -> DateTime<Utc> {
        let d = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        let t = NaiveTime::parse_from_str(time, "%H:%M").unwrap();
        resolve_local(tz, d, t).unwrap()
    }

    #[test]
    fn test_slots_respect_shift_end_boundary() {
        let tz = paris();
        // Monday 2025-06-02, 09:00-10:00 shift, 45 min service
        let shifts = vec![shift(0, "09:00", "10:00")];
        let day = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let slots: Vec<_> =
            compute_slots(&shifts, &[], day, day, tz, Duration::minutes(45), 15).collect();

        // 09:30 + 45min would cross the shift end: excluded, not truncated
        assert_eq!(
            slots,
            vec![
                local(tz, "2025-06-02", "09:00"),
                local(tz, "2025-06-02", "09:15"),
            ]
        );
    }

    #[test]
    fn test_slots_exclude_busy_intervals_half_open() {
        let tz = paris();
        let shifts = vec![shift(0, "09:00", "11:00")];
        let day = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        // Existing booking 09:30-10:00
        let busy = vec![(
            local(tz, "2025-06-02", "09:30"),
            local(tz, "2025-06-02", "10:00"),
        )];
        let slots: Vec<_> =
            compute_slots(&shifts, &busy, day, day, tz, Duration::minutes(30), 30).collect();

        // 09:00 ends exactly when the booking starts, 10:00 starts exactly
        // when it ends: both bookable under [start, end)
        assert_eq!(
            slots,
            vec![
                local(tz, "2025-06-02", "09:00"),
                local(tz, "2025-06-02", "10:00"),
                local(tz, "2025-06-02", "10:30"),
            ]
        );
    }

    #[test]
    fn test_slots_only_on_matching_weekday() {
        let tz = paris();
        let shifts = vec![shift(0, "09:00", "10:00")];
        // Tuesday: no Monday shift applies
        let day = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
        let count =
            compute_slots(&shifts, &[], day, day, tz, Duration::minutes(30), 15).count();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_unaligned_shift_start_rounds_up_to_grid() {
        let tz = paris();
        let shifts = vec![shift(0, "09:10", "10:00")];
        let day = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let slots: Vec<_> =
            compute_slots(&shifts, &[], day, day, tz, Duration::minutes(15), 15).collect();
        assert_eq!(slots.first(), Some(&local(tz, "2025-06-02", "09:15")));
    }

    #[test]
    fn test_dst_spring_forward_drops_skipped_window() {
        let tz = paris();
        // Paris skips 02:00-03:00 on Sunday 2025-03-30; a shift starting in
        // the gap has no valid instant that day
        let shifts = vec![shift(6, "02:00", "04:00")];
        let day = NaiveDate::from_ymd_opt(2025, 3, 30).unwrap();
        let count =
            compute_slots(&shifts, &[], day, day, tz, Duration::minutes(30), 30).count();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_dst_shift_spanning_transition_uses_absolute_instants() {
        let tz = paris();
        // Shift 01:00-04:00 local across the spring-forward: only two real
        // hours exist between those walls
        let shifts = vec![shift(6, "01:00", "04:00")];
        let day = NaiveDate::from_ymd_opt(2025, 3, 30).unwrap();
        let slots: Vec<_> =
            compute_slots(&shifts, &[], day, day, tz, Duration::minutes(60), 60).collect();
        // 01:00 and 03:00 local; a 02:00 wall-clock slot never existed
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[1] - slots[0], Duration::hours(1));
    }

    #[test]
    fn test_dst_fall_back_ambiguous_time_takes_earlier_offset() {
        let tz = paris();
        // Paris repeats 02:00-03:00 on Sunday 2025-10-26
        let day = NaiveDate::from_ymd_opt(2025, 10, 26).unwrap();
        let t = NaiveTime::from_hms_opt(2, 30, 0).unwrap();
        let resolved = resolve_local(tz, day, t).unwrap();
        // Earlier occurrence is still on CEST (UTC+2)
        assert_eq!(resolved, Utc.with_ymd_and_hms(2025, 10, 26, 0, 30, 0).unwrap());
    }

    #[test]
    fn test_window_within_shifts() {
        let tz = paris();
        let shifts = vec![shift(0, "09:00", "17:00")];

        let start = local(tz, "2025-06-02", "10:00");
        assert!(window_within_shifts(&shifts, tz, start, start + Duration::minutes(30)));

        // Crossing the shift end boundary
        let late = local(tz, "2025-06-02", "16:45");
        assert!(!window_within_shifts(&shifts, tz, late, late + Duration::minutes(30)));

        // Wrong weekday
        let tuesday = local(tz, "2025-06-03", "10:00");
        assert!(!window_within_shifts(&shifts, tz, tuesday, tuesday + Duration::minutes(30)));
    }

    #[test]
    fn test_window_within_overlapping_shifts_union() {
        let tz = paris();
        // Two overlapping windows for the same day; any containing window
        // qualifies
        let shifts = vec![shift(0, "09:00", "12:00"), shift(0, "11:00", "18:00")];
        let start = local(tz, "2025-06-02", "11:30");
        assert!(window_within_shifts(&shifts, tz, start, start + Duration::hours(2)));
    }
}
