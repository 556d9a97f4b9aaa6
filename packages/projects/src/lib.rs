// ABOUTME: Project record library for Sandpit
// ABOUTME: Exposes SQLite-backed storage of projects and their sandbox references

pub mod storage;

pub use storage::{Project, ProjectStorage, SandboxRecord, StorageError};
