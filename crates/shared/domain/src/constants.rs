//! Domain-level constants.
//!
//! These constants define business rules shared by every service.

// =============================================================================
// Entities
// =============================================================================

/// Label used in logs and errors when a repository does not name its entity
pub const DEFAULT_ENTITY_NAME: &str = "Entity";

// =============================================================================
// User Roles
// =============================================================================

/// Default role assigned to new members
pub const ROLE_MEMBER: &str = "member";

/// Administrator role with elevated privileges
pub const ROLE_ADMIN: &str = "admin";

// =============================================================================
// Authentication
// =============================================================================

/// Consecutive failed logins after which an identity is locked out
pub const MAX_FAILED_LOGIN_ATTEMPTS: u32 = 5;

/// How long a lockout lasts, in minutes
pub const LOCKOUT_DURATION_MINUTES: i64 = 15;
