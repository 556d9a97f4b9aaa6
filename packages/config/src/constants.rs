// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names used across Sandpit

// Daytona provider configuration
pub const DAYTONA_API_KEY: &str = "DAYTONA_API_KEY";
pub const DAYTONA_SERVER_URL: &str = "DAYTONA_SERVER_URL";
pub const DAYTONA_TARGET: &str = "DAYTONA_TARGET";
