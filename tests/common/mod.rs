/// Common test utilities
///
/// This module provides shared functionality for integration tests including:
/// - Fake volume providers reporting scaled-down free space
/// - A scaled wipe configuration
/// - A progress sink that captures each pass's file contents
#[allow(dead_code)]
pub mod test_helpers;
