//! Error kinds and the exit-code mapping from §7. `SilentSkip` (a malformed
//! line-program unit) is deliberately not a variant here — it never
//! reaches a caller; the unit is simply abandoned and parsing continues.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("could not open or map the object file")]
    FileOpen,
    #[error(".debug_line section not found")]
    SectionMissing,
    #[error("failed to allocate the result array")]
    AllocationFailure,
    #[error("unknown error")]
    Unknown,
}

/// The exit code returned by `elf_analyze` for this error.
pub fn analyze_exit_code(err: &Error) -> i32 {
    match err {
        Error::FileOpen => 1,
        Error::SectionMissing => -1,
        Error::AllocationFailure => 2,
        Error::Unknown => 2,
    }
}

/// The exit code returned by `get_symbols` for this error.
pub fn get_symbols_exit_code(err: &Error) -> i32 {
    match err {
        Error::FileOpen => 3,
        Error::SectionMissing => -1,
        Error::AllocationFailure => 2,
        Error::Unknown => -4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_match_contract() {
        assert_eq!(analyze_exit_code(&Error::FileOpen), 1);
        assert_eq!(analyze_exit_code(&Error::SectionMissing), -1);
        assert_eq!(analyze_exit_code(&Error::AllocationFailure), 2);
        assert_eq!(analyze_exit_code(&Error::Unknown), 2);

        assert_eq!(get_symbols_exit_code(&Error::FileOpen), 3);
        assert_eq!(get_symbols_exit_code(&Error::SectionMissing), -1);
        assert_eq!(get_symbols_exit_code(&Error::AllocationFailure), 2);
        assert_eq!(get_symbols_exit_code(&Error::Unknown), -4);
    }
}
