//! Common constants used throughout confspawn.

/// Prefix marking a file as a template when nothing else is configured
pub const DEFAULT_PREFIX: &str = "confspawn_";

/// Environment variable overriding the default template prefix
pub const PREFIX_ENV_VAR: &str = "CONFSPAWN_PREFIX";

/// Top-level settings section holding one sub-mapping per environment mode
pub const ENV_SECTION: &str = "confspawn_env";

/// Token opening and closing a placeholder: `~spwn~db.host~spwn~`
pub const SENTINEL: &str = "~spwn~";

/// Printed by the value command when a key cannot be resolved
pub const ABSENT_INDICATOR: &str = "None";
