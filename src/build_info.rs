/// Package version, with the short git SHA appended when build.rs could find one.
pub const VERSION: &str = env!("TM2BD_BUILD_VERSION");
