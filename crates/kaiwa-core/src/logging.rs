//! Structured logging field name constants.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, request failed but service healthy |
//! | INFO  | Lifecycle events (startup, shutdown), connection open/close |
//! | DEBUG | Decision points, dispatch outcomes, config choices |
//! | TRACE | Per-event fan-out detail |

/// Subsystem originating the log event.
/// Values: "server", "db", "inference", "search"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "hub", "presence", "assistant", "context", "openai"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "broadcast", "append", "respond", "build_context"
pub const OPERATION: &str = "op";

/// Identity UUID acting in the event.
pub const USER_ID: &str = "user_id";

/// Connection identifier within the registry.
pub const CONNECTION_ID: &str = "connection_id";

/// Channel a message or broadcast targets.
pub const CHANNEL: &str = "channel";

/// Message UUID being operated on.
pub const MESSAGE_ID: &str = "message_id";

/// Number of connections a broadcast reached.
pub const RECIPIENT_COUNT: &str = "recipient_count";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Byte length of a prompt or response.
pub const PROMPT_LEN: &str = "prompt_len";
pub const RESPONSE_LEN: &str = "response_len";
