//! Pure admission and capacity rules shared by the customer and admin paths.
//!
//! Nothing here touches storage; callers run these checks inside a store
//! transaction after locking the rows they read.

use chrono::{NaiveDate, NaiveTime};
use shared::{DEFAULT_MAX_RESERVATIONS, MAX_GUESTS, MIN_GUESTS};

use crate::error::{AppError, ConflictKind, InvalidArgument, Result};
use crate::models::Slot;

pub fn check_guest_count(guest_count: i32) -> Result<()> {
    if (MIN_GUESTS..=MAX_GUESTS).contains(&guest_count) {
        Ok(())
    } else {
        Err(AppError::InvalidArgument(InvalidArgument::GuestCount))
    }
}

pub fn check_bookable_date(date: NaiveDate, today: NaiveDate) -> Result<()> {
    if date < today {
        return Err(AppError::InvalidArgument(InvalidArgument::ReservationDate));
    }
    Ok(())
}

pub fn check_time_range(from: NaiveTime, to: NaiveTime) -> Result<()> {
    if from < to {
        Ok(())
    } else {
        Err(AppError::InvalidArgument(InvalidArgument::TimeRange))
    }
}

/// Capacity for a new slot: the requested value when positive, otherwise the default.
pub fn initial_capacity(requested: Option<i32>) -> i32 {
    match requested {
        Some(max) if max > 0 => max,
        _ => DEFAULT_MAX_RESERVATIONS,
    }
}

/// Capacity after an edit. Non-positive requests keep the current capacity, and
/// the result may never drop below the seats already taken.
pub fn revised_capacity(slot: &Slot, requested: Option<i32>) -> Result<i32> {
    let max = match requested {
        Some(max) if max > 0 => max,
        _ => slot.max_reservations,
    };
    if max < slot.current_reservations {
        return Err(AppError::Conflict(ConflictKind::CapacityBelowOccupancy));
    }
    Ok(max)
}

/// Occupancy after admitting one more reservation.
pub fn occupy(slot: &Slot) -> Result<i32> {
    if slot.current_reservations >= slot.max_reservations {
        return Err(AppError::Conflict(ConflictKind::SlotFull));
    }
    Ok(slot.current_reservations + 1)
}

/// Occupancy after releasing one reservation, floored at zero.
pub fn release(slot: &Slot) -> i32 {
    (slot.current_reservations - 1).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn slot(current: i32, max: i32) -> Slot {
        Slot {
            id: Uuid::new_v4(),
            slot_from: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            slot_to: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            active: true,
            max_reservations: max,
            current_reservations: current,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn guest_count_bounds_are_inclusive() {
        assert!(check_guest_count(1).is_ok());
        assert!(check_guest_count(10).is_ok());
        assert!(matches!(
            check_guest_count(0),
            Err(AppError::InvalidArgument(InvalidArgument::GuestCount))
        ));
        assert!(matches!(
            check_guest_count(11),
            Err(AppError::InvalidArgument(InvalidArgument::GuestCount))
        ));
    }

    #[test]
    fn today_is_bookable_yesterday_is_not() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert!(check_bookable_date(today, today).is_ok());
        assert!(check_bookable_date(today.succ_opt().unwrap(), today).is_ok());
        assert!(check_bookable_date(today.pred_opt().unwrap(), today).is_err());
    }

    #[test]
    fn inverted_and_empty_ranges_are_rejected() {
        let five = NaiveTime::from_hms_opt(17, 0, 0).unwrap();
        let six = NaiveTime::from_hms_opt(18, 0, 0).unwrap();
        assert!(check_time_range(five, six).is_ok());
        assert!(check_time_range(six, five).is_err());
        assert!(check_time_range(five, five).is_err());
    }

    #[test]
    fn capacity_defaults_to_ten() {
        assert_eq!(initial_capacity(None), 10);
        assert_eq!(initial_capacity(Some(0)), 10);
        assert_eq!(initial_capacity(Some(-3)), 10);
        assert_eq!(initial_capacity(Some(4)), 4);
    }

    #[test]
    fn revised_capacity_keeps_current_on_non_positive_request() {
        let s = slot(2, 6);
        assert_eq!(revised_capacity(&s, None).unwrap(), 6);
        assert_eq!(revised_capacity(&s, Some(0)).unwrap(), 6);
        assert_eq!(revised_capacity(&s, Some(8)).unwrap(), 8);
    }

    #[test]
    fn revised_capacity_cannot_strand_seats() {
        let s = slot(5, 6);
        assert!(matches!(
            revised_capacity(&s, Some(4)),
            Err(AppError::Conflict(ConflictKind::CapacityBelowOccupancy))
        ));
        assert_eq!(revised_capacity(&s, Some(5)).unwrap(), 5);
    }

    #[test]
    fn occupy_stops_at_capacity() {
        assert_eq!(occupy(&slot(0, 2)).unwrap(), 1);
        assert_eq!(occupy(&slot(1, 2)).unwrap(), 2);
        assert!(matches!(
            occupy(&slot(2, 2)),
            Err(AppError::Conflict(ConflictKind::SlotFull))
        ));
    }

    #[test]
    fn release_never_goes_negative() {
        assert_eq!(release(&slot(2, 2)), 1);
        assert_eq!(release(&slot(0, 2)), 0);
    }
}
