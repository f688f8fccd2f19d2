use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use shared::ErrorResponse;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    User,
    Slot,
    Reservation,
    OpeningHours,
    Event,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::User => "User",
            Resource::Slot => "Slot",
            Resource::Reservation => "Reservation",
            Resource::OpeningHours => "Opening hours",
            Resource::Event => "Event",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidArgument {
    #[error("Invalid number of guests (must be between 1 and 10)")]
    GuestCount,
    #[error("Start time must be before end time")]
    TimeRange,
    #[error("Reservation date must be today or in the future")]
    ReservationDate,
    #[error("Unknown role: {0}")]
    Role(String),
    #[error("{0}")]
    Validation(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConflictKind {
    #[error("You already have a reservation on this day")]
    DuplicateDailyReservation,
    #[error("This slot is fully booked")]
    SlotFull,
    #[error("Slot with this time range already exists")]
    DuplicateSlot,
    #[error("Slot still has reservations")]
    SlotInUse,
    #[error("Capacity cannot be lower than current reservations")]
    CapacityBelowOccupancy,
    #[error("Opening hours already exist for this day")]
    DuplicateOpeningHours,
    #[error("Username already exists")]
    UsernameTaken,
    #[error("Email already exists")]
    EmailTaken,
    #[error("Concurrent update detected, please retry")]
    TransactionAborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ForbiddenKind {
    #[error("You can only delete your own reservations")]
    NotOwner,
    #[error("Administrator role required")]
    AdminRequired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("Missing Authorization header")]
    MissingToken,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Account is disabled")]
    AccountDisabled,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(Resource),
    #[error("{0}")]
    InvalidArgument(InvalidArgument),
    #[error("{0}")]
    Conflict(ConflictKind),
    #[error("{0}")]
    Forbidden(ForbiddenKind),
    #[error("{0}")]
    Unauthorized(AuthFailure),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(Resource::User) => "USER_NOT_FOUND",
            AppError::NotFound(Resource::Slot) => "SLOT_NOT_FOUND",
            AppError::NotFound(Resource::Reservation) => "RESERVATION_NOT_FOUND",
            AppError::NotFound(Resource::OpeningHours) => "OPENING_HOURS_NOT_FOUND",
            AppError::NotFound(Resource::Event) => "EVENT_NOT_FOUND",
            AppError::InvalidArgument(InvalidArgument::GuestCount) => "INVALID_GUEST_COUNT",
            AppError::InvalidArgument(InvalidArgument::TimeRange) => "INVALID_TIME_RANGE",
            AppError::InvalidArgument(InvalidArgument::ReservationDate) => "INVALID_RESERVATION_DATE",
            AppError::InvalidArgument(InvalidArgument::Role(_)) => "INVALID_ROLE",
            AppError::InvalidArgument(InvalidArgument::Validation(_)) => "VALIDATION_FAILED",
            AppError::Conflict(ConflictKind::DuplicateDailyReservation) => "DUPLICATE_DAILY_RESERVATION",
            AppError::Conflict(ConflictKind::SlotFull) => "SLOT_FULL",
            AppError::Conflict(ConflictKind::DuplicateSlot) => "DUPLICATE_SLOT",
            AppError::Conflict(ConflictKind::SlotInUse) => "SLOT_IN_USE",
            AppError::Conflict(ConflictKind::CapacityBelowOccupancy) => "CAPACITY_BELOW_OCCUPANCY",
            AppError::Conflict(ConflictKind::DuplicateOpeningHours) => "DUPLICATE_OPENING_HOURS",
            AppError::Conflict(ConflictKind::UsernameTaken) => "USERNAME_TAKEN",
            AppError::Conflict(ConflictKind::EmailTaken) => "EMAIL_TAKEN",
            AppError::Conflict(ConflictKind::TransactionAborted) => "TRANSACTION_ABORTED",
            AppError::Forbidden(ForbiddenKind::NotOwner) => "NOT_OWNER",
            AppError::Forbidden(ForbiddenKind::AdminRequired) => "ADMIN_REQUIRED",
            AppError::Unauthorized(AuthFailure::MissingToken) => "MISSING_TOKEN",
            AppError::Unauthorized(AuthFailure::InvalidToken) => "INVALID_TOKEN",
            AppError::Unauthorized(AuthFailure::InvalidCredentials) => "INVALID_CREDENTIALS",
            AppError::Unauthorized(AuthFailure::AccountDisabled) => "ACCOUNT_DISABLED",
            AppError::Unavailable(_) => "SERVICE_UNAVAILABLE",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<DieselError> for AppError {
    fn from(err: DieselError) -> Self {
        match &err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                match info.constraint_name() {
                    Some("reservations_user_date_key") => {
                        AppError::Conflict(ConflictKind::DuplicateDailyReservation)
                    }
                    Some("reservation_slots_range_key") => {
                        AppError::Conflict(ConflictKind::DuplicateSlot)
                    }
                    Some("users_username_key") => AppError::Conflict(ConflictKind::UsernameTaken),
                    Some("users_email_key") => AppError::Conflict(ConflictKind::EmailTaken),
                    Some("opening_hours_day_key") => {
                        AppError::Conflict(ConflictKind::DuplicateOpeningHours)
                    }
                    _ => AppError::Conflict(ConflictKind::TransactionAborted),
                }
            }
            DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, info)
                if info.constraint_name() == Some("reservation_slots_occupancy_check") =>
            {
                AppError::Conflict(ConflictKind::SlotFull)
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info)
                if info.constraint_name() == Some("reservations_slot_id_fkey") =>
            {
                AppError::Conflict(ConflictKind::SlotInUse)
            }
            DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
                AppError::Conflict(ConflictKind::TransactionAborted)
            }
            _ => AppError::Internal(err.to_string()),
        }
    }
}

impl<E: std::error::Error + 'static> From<bb8::RunError<E>> for AppError {
    fn from(err: bb8::RunError<E>) -> Self {
        AppError::Unavailable(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidArgument(InvalidArgument::Validation(err.to_string()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error.message = %self, "Request failed");
        }
        let body = ErrorResponse {
            error: self.to_string(),
            code: self.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}
